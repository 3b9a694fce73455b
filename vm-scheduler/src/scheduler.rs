//! Task scheduler
//!
//! The facade the simulation driver talks to. One `TaskScheduler` owns the
//! registries of a single run; create a new one per run.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::fault_tolerance::FaultInjector;
use crate::policy::RoundRobinCursor;
use crate::protocol::{CompletionNotice, Task, TaskId, Vm, VmId};
use crate::reassignment::{Reassignment, ReassignmentEngine};
use crate::registry::{TaskRegistry, VmRegistry};
use crate::report::SchedulingReport;

/// Fault-tolerant round-robin scheduler for one run
#[derive(Debug)]
pub struct TaskScheduler {
    run_id: Uuid,
    config: SchedulerConfig,
    vms: VmRegistry,
    tasks: TaskRegistry,
    cursor: RoundRobinCursor,
    injector: FaultInjector,
    engine: ReassignmentEngine,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl TaskScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let engine = ReassignmentEngine::new(config.fault_tolerance.reassignment_strategy);
        TaskScheduler {
            run_id: Uuid::new_v4(),
            config,
            vms: VmRegistry::new(),
            tasks: TaskRegistry::new(),
            cursor: RoundRobinCursor::new(),
            injector: FaultInjector::new(),
            engine,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn vms(&self) -> &VmRegistry {
        &self.vms
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn cursor(&self) -> RoundRobinCursor {
        self.cursor
    }

    /// Register a batch of VMs.
    ///
    /// The batch is checked up front; on a duplicate id nothing is registered.
    pub fn submit_vms(&mut self, vms: Vec<Vm>) -> SchedulerResult<()> {
        let mut seen = HashSet::new();
        for vm in &vms {
            if self.vms.contains(&vm.id) || !seen.insert(vm.id.as_str()) {
                return Err(SchedulerError::duplicate_vm(&vm.id));
            }
        }
        let count = vms.len();
        for vm in vms {
            self.vms.register(vm)?;
        }
        info!("Submitted {} VM(s), pool size {}", count, self.vms.len());
        Ok(())
    }

    /// Register a batch of tasks, all or nothing.
    pub fn submit_tasks(&mut self, tasks: Vec<Task>) -> SchedulerResult<()> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if self.tasks.contains(&task.id) || !seen.insert(task.id.as_str()) {
                return Err(SchedulerError::duplicate_task(&task.id));
            }
        }
        let count = tasks.len();
        for task in tasks {
            self.tasks.register(task)?;
        }
        info!("Submitted {} task(s), {} in total", count, self.tasks.len());
        Ok(())
    }

    /// Bind every task round-robin over the VM pool, skipping failed VMs.
    ///
    /// The cursor restarts at zero on every call, so the same inputs always
    /// give the same mapping. Every task is placed afresh: earlier moves and
    /// completions are forgotten. If no VM is active the whole pass is rejected
    /// and no binding changes.
    pub fn run_initial_assignment(&mut self) -> SchedulerResult<BTreeMap<TaskId, VmId>> {
        let task_ids: Vec<TaskId> = self.tasks.iter().map(|task| task.id.clone()).collect();
        let candidates = self.vms.ids();
        let excluded: HashSet<VmId> = self.vms.failed_ids().into_iter().collect();

        let mut cursor = RoundRobinCursor::new();
        let placements = cursor.plan(&task_ids, &candidates, &excluded)?;

        for (task_id, vm_id) in &placements {
            self.tasks.reset_binding(task_id, vm_id)?;
            debug!("Task {} bound to VM {}", task_id, vm_id);
        }
        self.cursor = cursor;

        info!(
            "Initial assignment placed {} task(s) on {} active VM(s)",
            placements.len(),
            candidates.len() - excluded.len()
        );
        Ok(placements.into_iter().collect())
    }

    /// Fail a VM and return the tasks it orphaned, in submission order
    pub fn inject_failure(&mut self, vm_id: &str) -> SchedulerResult<Vec<TaskId>> {
        self.injector.inject(&mut self.vms, &self.tasks, vm_id)
    }

    /// Move orphaned tasks off `failed_vm`.
    ///
    /// Never fails as a whole: each task gets its own outcome.
    pub fn reassign(
        &mut self,
        orphans: &[TaskId],
        failed_vm: &str,
    ) -> BTreeMap<TaskId, Reassignment> {
        self.engine
            .reassign(&self.vms, &mut self.tasks, &mut self.cursor, orphans, failed_vm)
    }

    /// Inject a failure and immediately reassign its orphans
    pub fn recover_from_failure(
        &mut self,
        vm_id: &str,
    ) -> SchedulerResult<BTreeMap<TaskId, Reassignment>> {
        let orphans = self.inject_failure(vm_id)?;
        Ok(self.reassign(&orphans, vm_id))
    }

    /// Read-only snapshot of every current binding
    pub fn assignments(&self) -> BTreeMap<TaskId, VmId> {
        self.tasks.assignments()
    }

    /// Bindings that point at an active VM
    pub fn healthy_assignments(&self) -> BTreeMap<TaskId, VmId> {
        self.tasks
            .assignments()
            .into_iter()
            .filter(|(_, vm_id)| self.vms.is_active(vm_id))
            .collect()
    }

    /// Store a completion notice from the execution engine
    pub fn record_completion(&mut self, notice: CompletionNotice) -> SchedulerResult<()> {
        self.tasks.record_completion(&notice)
    }

    /// Build a report of the current task states
    pub fn report(&self) -> SchedulingReport {
        SchedulingReport::build(
            self.run_id,
            self.config.fault_tolerance.reassignment_strategy,
            &self.vms,
            &self.tasks,
        )
    }
}
