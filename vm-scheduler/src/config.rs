//! Scheduler configuration
//!
//! This module defines the knobs of the fault-tolerant scheduler.

use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fault tolerance configuration
    pub fault_tolerance: FaultToleranceConfig,
}

impl SchedulerConfig {
    pub fn with_strategy(strategy: ReassignmentStrategy) -> Self {
        SchedulerConfig {
            fault_tolerance: FaultToleranceConfig {
                reassignment_strategy: strategy,
            },
        }
    }
}

/// How orphaned tasks are spread over the surviving VMs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReassignmentStrategy {
    /// Keep rotating from where the previous pass stopped
    #[default]
    ContinueCursor,

    /// Every orphan goes to the first active VM in registration order
    FirstAvailable,
}

impl std::str::FromStr for ReassignmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continue-cursor" | "round-robin" => Ok(ReassignmentStrategy::ContinueCursor),
            "first-available" => Ok(ReassignmentStrategy::FirstAvailable),
            other => Err(format!("unknown reassignment strategy: {other}")),
        }
    }
}

/// Fault tolerance configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultToleranceConfig {
    /// Placement rule for tasks orphaned by a VM failure
    pub reassignment_strategy: ReassignmentStrategy,
}
