//! Lock-guarded scheduler handle
//!
//! When several simulated events are driven from different threads, every
//! read-modify-write on the registries has to happen under one lock. Fault
//! injection and the reassignment that follows it are done under a single
//! acquisition so no thread can observe or bind to a VM between the two.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::error::SchedulerResult;
use crate::protocol::{CompletionNotice, Task, TaskId, Vm, VmId};
use crate::reassignment::Reassignment;
use crate::report::SchedulingReport;
use crate::scheduler::TaskScheduler;

/// Cloneable, thread-safe handle to a [`TaskScheduler`]
#[derive(Debug, Clone)]
pub struct SharedScheduler {
    inner: Arc<Mutex<TaskScheduler>>,
}

impl SharedScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::from_scheduler(TaskScheduler::new(config))
    }

    pub fn from_scheduler(scheduler: TaskScheduler) -> Self {
        SharedScheduler {
            inner: Arc::new(Mutex::new(scheduler)),
        }
    }

    /// Run `f` with exclusive access to the scheduler
    pub fn with<R>(&self, f: impl FnOnce(&mut TaskScheduler) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn submit_vms(&self, vms: Vec<Vm>) -> SchedulerResult<()> {
        self.inner.lock().submit_vms(vms)
    }

    pub fn submit_tasks(&self, tasks: Vec<Task>) -> SchedulerResult<()> {
        self.inner.lock().submit_tasks(tasks)
    }

    pub fn run_initial_assignment(&self) -> SchedulerResult<BTreeMap<TaskId, VmId>> {
        self.inner.lock().run_initial_assignment()
    }

    /// Fail a VM and reassign its orphans under one lock
    pub fn recover_from_failure(
        &self,
        vm_id: &str,
    ) -> SchedulerResult<BTreeMap<TaskId, Reassignment>> {
        self.inner.lock().recover_from_failure(vm_id)
    }

    pub fn assignments(&self) -> BTreeMap<TaskId, VmId> {
        self.inner.lock().assignments()
    }

    pub fn record_completion(&self, notice: CompletionNotice) -> SchedulerResult<()> {
        self.inner.lock().record_completion(notice)
    }

    pub fn report(&self) -> SchedulingReport {
        self.inner.lock().report()
    }
}
