//! Error types for the scheduling core
//!
//! Every error is recoverable. Registry errors abort only the operation that
//! raised them; `NoAvailableResource` aborts an initial assignment pass but is
//! scoped to a single task during reassignment.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::protocol::{TaskId, VmId};

/// The kind of entity an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Vm,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Vm => write!(f, "VM"),
            EntityKind::Task => write!(f, "task"),
        }
    }
}

/// Unified error type for the scheduler
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerError {
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("unknown {kind} id: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("VM {0} has already failed")]
    AlreadyFailed(VmId),

    /// Every candidate VM is failed or excluded.
    #[error("no available VM{}", task_suffix(.task_id))]
    NoAvailableResource { task_id: Option<TaskId> },
}

fn task_suffix(task_id: &Option<TaskId>) -> String {
    match task_id {
        Some(id) => format!(" for task {id}"),
        None => String::new(),
    }
}

impl SchedulerError {
    pub fn duplicate_vm(id: &str) -> Self {
        SchedulerError::DuplicateId {
            kind: EntityKind::Vm,
            id: id.to_string(),
        }
    }

    pub fn duplicate_task(id: &str) -> Self {
        SchedulerError::DuplicateId {
            kind: EntityKind::Task,
            id: id.to_string(),
        }
    }

    pub fn vm_not_found(id: &str) -> Self {
        SchedulerError::NotFound {
            kind: EntityKind::Vm,
            id: id.to_string(),
        }
    }

    pub fn task_not_found(id: &str) -> Self {
        SchedulerError::NotFound {
            kind: EntityKind::Task,
            id: id.to_string(),
        }
    }

    /// Whether the error signals total capacity loss
    pub fn is_capacity_loss(&self) -> bool {
        matches!(self, SchedulerError::NoAvailableResource { .. })
    }
}

/// Result alias used throughout the crate
pub type SchedulerResult<T> = Result<T, SchedulerError>;
