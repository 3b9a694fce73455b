//! Fault-tolerant task scheduling for virtual machines
//!
//! This crate places tasks on a pool of VMs round-robin, lets a driver fail a
//! VM, and moves the orphaned tasks onto the surviving VMs.
//!
//! # Modules
//!
//! - [`registry`]: VM and task registries
//! - [`policy`]: exclusion-aware round-robin cursor
//! - [`fault_tolerance`]: fault injection
//! - [`reassignment`]: reassignment of orphaned tasks
//! - [`scheduler`]: the facade a simulation driver talks to
//! - [`shared`]: a lock-guarded handle for multi-threaded drivers
//! - [`report`]: report model and renderers
//!
//! # Examples
//!
//! ```rust
//! use vm_scheduler::{Task, TaskScheduler, Vm, VmCapabilities};
//!
//! let mut scheduler = TaskScheduler::default();
//! scheduler
//!     .submit_vms(vec![
//!         Vm::new("A", VmCapabilities::default()),
//!         Vm::new("B", VmCapabilities::default()),
//!     ])
//!     .unwrap();
//! scheduler
//!     .submit_tasks(vec![Task::with_length("T0", 1000), Task::with_length("T1", 1000)])
//!     .unwrap();
//!
//! let mapping = scheduler.run_initial_assignment().unwrap();
//! assert_eq!(mapping["T1"], "B");
//!
//! let orphans = scheduler.inject_failure("B").unwrap();
//! let outcomes = scheduler.reassign(&orphans, "B");
//! assert_eq!(outcomes["T1"].vm(), Some("A"));
//! ```

pub mod config;
pub mod error;
pub mod fault_tolerance;
pub mod policy;
pub mod protocol;
pub mod reassignment;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod shared;

pub use config::{FaultToleranceConfig, ReassignmentStrategy, SchedulerConfig};
pub use error::{EntityKind, SchedulerError, SchedulerResult};
pub use fault_tolerance::FaultInjector;
pub use policy::RoundRobinCursor;
pub use protocol::{
    CompletionNotice, CompletionStatus, Task, TaskDemand, TaskId, TaskStatus, Vm, VmCapabilities,
    VmId, VmStatus,
};
pub use reassignment::{Reassignment, ReassignmentEngine};
pub use registry::{TaskRegistry, VmRegistry};
pub use report::{JsonReporter, Reporter, SchedulingReport, TableReporter, TaskOutcome};
pub use scheduler::TaskScheduler;
pub use shared::SharedScheduler;
