//! Task registry
//!
//! Stores tasks and their bindings. It never checks VM liveness; deciding
//! where a task may go belongs to the policy.

use std::collections::{BTreeMap, HashMap};

use crate::error::{SchedulerError, SchedulerResult};
use crate::protocol::{CompletionNotice, CompletionStatus, Task, TaskId, TaskStatus, VmId};

/// Tasks in submission order with an id index
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. It enters as Pending with no binding.
    pub fn register(&mut self, mut task: Task) -> SchedulerResult<()> {
        if self.index.contains_key(&task.id) {
            return Err(SchedulerError::duplicate_task(&task.id));
        }
        task.status = TaskStatus::Pending;
        task.assigned_vm = None;
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Bind a task to a VM, replacing any previous binding
    pub fn assign(&mut self, task_id: &str, vm_id: &str) -> SchedulerResult<()> {
        let task = self.get_mut(task_id)?;
        task.assigned_vm = Some(vm_id.to_string());
        task.status = TaskStatus::Assigned;
        task.failure = None;
        Ok(())
    }

    /// Bind a task as a fresh placement, forgetting earlier moves and runs
    pub fn reset_binding(&mut self, task_id: &str, vm_id: &str) -> SchedulerResult<()> {
        let task = self.get_mut(task_id)?;
        task.assigned_vm = Some(vm_id.to_string());
        task.status = TaskStatus::Assigned;
        task.failure = None;
        task.reassignments = 0;
        task.exec_start = None;
        task.finish_time = None;
        Ok(())
    }

    /// Mark a task as failed and drop its binding
    pub fn mark_failed(&mut self, task_id: &str, reason: impl Into<String>) -> SchedulerResult<()> {
        let task = self.get_mut(task_id)?;
        task.assigned_vm = None;
        task.status = TaskStatus::Failed;
        task.failure = Some(reason.into());
        Ok(())
    }

    pub(crate) fn note_reassigned(&mut self, task_id: &str) -> SchedulerResult<()> {
        self.get_mut(task_id)?.reassignments += 1;
        Ok(())
    }

    /// Store the outcome reported by the execution engine.
    ///
    /// The binding is left as is so the reporter can show where the task ran.
    pub fn record_completion(&mut self, notice: &CompletionNotice) -> SchedulerResult<()> {
        let task = self.get_mut(&notice.task_id)?;
        task.status = match notice.status {
            CompletionStatus::Completed => TaskStatus::Completed,
            CompletionStatus::Failed => TaskStatus::Failed,
        };
        task.exec_start = Some(notice.exec_start);
        task.finish_time = Some(notice.finish_time);
        Ok(())
    }

    /// Tasks currently bound to `vm_id`, in submission order
    pub fn tasks_bound_to(&self, vm_id: &str) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| task.assigned_vm.as_deref() == Some(vm_id))
            .map(|task| task.id.clone())
            .collect()
    }

    /// Snapshot of every current binding
    pub fn assignments(&self) -> BTreeMap<TaskId, VmId> {
        self.tasks
            .iter()
            .filter_map(|task| {
                task.assigned_vm
                    .as_ref()
                    .map(|vm| (task.id.clone(), vm.clone()))
            })
            .collect()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.index.get(task_id).map(|&slot| &self.tasks[slot])
    }

    fn get_mut(&mut self, task_id: &str) -> SchedulerResult<&mut Task> {
        let slot = *self
            .index
            .get(task_id)
            .ok_or_else(|| SchedulerError::task_not_found(task_id))?;
        Ok(&mut self.tasks[slot])
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    /// Position of a task in submission order
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.index.get(task_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
