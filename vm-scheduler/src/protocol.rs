//! Data model shared by the registries, the policy and the reporter
//!
//! VMs and tasks are created once per run and never removed. The core only
//! mutates a VM's status and a task's binding/status; capacity and demand
//! figures are carried through untouched for the execution engine and the
//! reporter.

use serde::{Deserialize, Serialize};

/// Unique identifier for VM instances
pub type VmId = String;

/// Unique identifier for tasks
pub type TaskId = String;

/// VM capabilities
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VmCapabilities {
    /// Processing rate per processing element, in MIPS
    pub mips: u64,

    /// Number of processing elements
    pub pes: u32,

    /// Memory size in MB
    pub ram_mb: u64,

    /// Bandwidth in Mbit/s
    pub bandwidth: u64,

    /// Image size in MB
    pub storage_mb: u64,

    /// Hypervisor name
    pub vmm: String,
}

impl Default for VmCapabilities {
    fn default() -> Self {
        VmCapabilities {
            mips: 1000,
            pes: 1,
            ram_mb: 2048,
            bandwidth: 1000,
            storage_mb: 10000,
            vmm: "Xen".to_string(),
        }
    }
}

/// VM liveness
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum VmStatus {
    Active,
    Failed,
}

/// A virtual machine tasks can be bound to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Vm {
    pub id: VmId,
    pub capabilities: VmCapabilities,
    pub status: VmStatus,
}

impl Vm {
    pub fn new(id: impl Into<VmId>, capabilities: VmCapabilities) -> Self {
        Vm {
            id: id.into(),
            capabilities,
            status: VmStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == VmStatus::Active
    }
}

/// Workload a task asks for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskDemand {
    /// Length in millions of instructions
    pub length: u64,

    /// Processing elements the task wants
    pub pes: u32,

    /// Input size in bytes
    pub file_size: u64,

    /// Output size in bytes
    pub output_size: u64,
}

impl TaskDemand {
    pub fn with_length(length: u64) -> Self {
        TaskDemand {
            length,
            pes: 1,
            file_size: 300,
            output_size: 300,
        }
    }
}

/// Task status
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum TaskStatus {
    /// Task is registered but not bound
    Pending,

    /// Task is bound to an active VM
    Assigned,

    /// Task finished successfully
    Completed,

    /// Task failed, either for lack of capacity or as reported by the
    /// execution engine
    Failed,
}

/// Task information
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub demand: TaskDemand,
    pub assigned_vm: Option<VmId>,
    pub status: TaskStatus,
    /// Number of times the task was moved off a failed VM
    pub reassignments: u32,
    /// Why the task failed, if it did
    pub failure: Option<String>,
    pub exec_start: Option<f64>,
    pub finish_time: Option<f64>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, demand: TaskDemand) -> Self {
        Task {
            id: id.into(),
            demand,
            assigned_vm: None,
            status: TaskStatus::Pending,
            reassignments: 0,
            failure: None,
            exec_start: None,
            finish_time: None,
        }
    }

    /// Shorthand for a task with default sizes and the given length
    pub fn with_length(id: impl Into<TaskId>, length: u64) -> Self {
        Task::new(id, TaskDemand::with_length(length))
    }
}

/// Terminal status reported by the execution engine
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum CompletionStatus {
    Completed,
    Failed,
}

/// Completion notification for one task, as sent by the execution engine
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompletionNotice {
    pub task_id: TaskId,
    pub status: CompletionStatus,
    pub exec_start: f64,
    pub finish_time: f64,
}
