//! Reassignment of tasks orphaned by a VM failure
//!
//! Orphans are processed in submission order. A task that cannot be placed is
//! marked Failed and the pass carries on with the rest, so one lost task never
//! blocks the others. Tasks that already finished keep their binding as the
//! record of where they ran.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::ReassignmentStrategy;
use crate::error::SchedulerError;
use crate::policy::{RoundRobinCursor, first_available};
use crate::protocol::{TaskId, TaskStatus, VmId};
use crate::registry::{TaskRegistry, VmRegistry};

/// Outcome of reassigning one orphaned task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reassignment {
    /// The task now runs on this VM
    Moved(VmId),

    /// The task could not be placed and is now Failed
    Failed(SchedulerError),

    /// The task had already finished with this status and was left alone
    Untouched(TaskStatus),
}

impl Reassignment {
    pub fn vm(&self) -> Option<&str> {
        match self {
            Reassignment::Moved(vm) => Some(vm),
            Reassignment::Failed(_) | Reassignment::Untouched(_) => None,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, Reassignment::Moved(_))
    }
}

/// Re-binds orphaned tasks onto surviving VMs
#[derive(Debug, Clone, Copy, Default)]
pub struct ReassignmentEngine {
    strategy: ReassignmentStrategy,
}

impl ReassignmentEngine {
    pub fn new(strategy: ReassignmentStrategy) -> Self {
        ReassignmentEngine { strategy }
    }

    pub fn strategy(&self) -> ReassignmentStrategy {
        self.strategy
    }

    /// Move every orphan off `failed_vm`.
    ///
    /// `failed_vm` and every VM already Failed in the registry are excluded.
    /// `cursor` is shared with the initial pass so that rotation carries on
    /// where it stopped.
    pub fn reassign(
        &self,
        vms: &VmRegistry,
        tasks: &mut TaskRegistry,
        cursor: &mut RoundRobinCursor,
        orphans: &[TaskId],
        failed_vm: &str,
    ) -> BTreeMap<TaskId, Reassignment> {
        let candidates = vms.ids();
        let mut excluded: HashSet<VmId> = vms.failed_ids().into_iter().collect();
        excluded.insert(failed_vm.to_string());

        let mut ordered: Vec<&TaskId> = orphans.iter().collect();
        ordered.sort_by_key(|id| tasks.position(id).unwrap_or(usize::MAX));
        let mut seen = HashSet::new();
        ordered.retain(|id| seen.insert(*id));

        let mut outcomes = BTreeMap::new();
        for task_id in ordered {
            let outcome = self.reassign_one(tasks, cursor, &candidates, &excluded, task_id);
            outcomes.insert(task_id.clone(), outcome);
        }

        let moved = outcomes.values().filter(|o| o.is_moved()).count();
        let untouched = outcomes
            .values()
            .filter(|o| matches!(o, Reassignment::Untouched(_)))
            .count();
        info!(
            "Reassignment off VM {} finished: {} moved, {} failed, {} already finished",
            failed_vm,
            moved,
            outcomes.len() - moved - untouched,
            untouched
        );
        outcomes
    }

    fn reassign_one(
        &self,
        tasks: &mut TaskRegistry,
        cursor: &mut RoundRobinCursor,
        candidates: &[VmId],
        excluded: &HashSet<VmId>,
        task_id: &str,
    ) -> Reassignment {
        let status = match tasks.get(task_id) {
            Some(task) => task.status,
            None => return Reassignment::Failed(SchedulerError::task_not_found(task_id)),
        };
        if matches!(status, TaskStatus::Completed | TaskStatus::Failed) {
            debug!("Task {} already finished as {:?}, not moved", task_id, status);
            return Reassignment::Untouched(status);
        }

        let picked = match self.strategy {
            ReassignmentStrategy::ContinueCursor => cursor.pick(task_id, candidates, excluded),
            ReassignmentStrategy::FirstAvailable => first_available(candidates, excluded)
                .cloned()
                .ok_or_else(|| SchedulerError::NoAvailableResource {
                    task_id: Some(task_id.to_string()),
                }),
        };

        let result = picked.and_then(|vm_id| {
            tasks.assign(task_id, &vm_id)?;
            tasks.note_reassigned(task_id)?;
            Ok(vm_id)
        });

        match result {
            Ok(vm_id) => {
                debug!("Task {} reassigned to VM {}", task_id, vm_id);
                Reassignment::Moved(vm_id)
            }
            Err(err) => {
                warn!("Task {} permanently failed: {}", task_id, err);
                if let Err(e) = tasks.mark_failed(task_id, err.to_string()) {
                    warn!("Could not mark task {} as failed: {}", task_id, e);
                }
                Reassignment::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CompletionNotice, CompletionStatus, Task, Vm, VmCapabilities};

    fn setup(vm_ids: &[&str], bindings: &[(&str, &str)]) -> (VmRegistry, TaskRegistry) {
        let mut vms = VmRegistry::new();
        for id in vm_ids {
            vms.register(Vm::new(*id, VmCapabilities::default())).unwrap();
        }
        let mut tasks = TaskRegistry::new();
        for (task, vm) in bindings {
            tasks.register(Task::with_length(*task, 1000)).unwrap();
            tasks.assign(task, vm).unwrap();
        }
        (vms, tasks)
    }

    fn orphans(ids: &[&str]) -> Vec<TaskId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_continue_cursor() {
        let (mut vms, mut tasks) = setup(
            &["A", "B", "C"],
            &[("T0", "A"), ("T1", "B"), ("T2", "C"), ("T3", "A"), ("T4", "B")],
        );
        vms.mark_failed("B").unwrap();
        let mut cursor = RoundRobinCursor::at(5);
        let outcomes = ReassignmentEngine::default().reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["T1", "T4"]),
            "B",
        );
        assert_eq!(outcomes["T1"], Reassignment::Moved("C".to_string()));
        assert_eq!(outcomes["T4"], Reassignment::Moved("A".to_string()));
        assert!(tasks.tasks_bound_to("B").is_empty());
        assert_eq!(tasks.get("T1").unwrap().reassignments, 1);
    }

    #[test]
    fn test_first_available() {
        let (mut vms, mut tasks) = setup(
            &["A", "B", "C"],
            &[("T0", "A"), ("T1", "B"), ("T2", "C"), ("T3", "A"), ("T4", "B")],
        );
        vms.mark_failed("A").unwrap();
        let mut cursor = RoundRobinCursor::at(5);
        let outcomes = ReassignmentEngine::new(ReassignmentStrategy::FirstAvailable).reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["T0", "T3"]),
            "A",
        );
        assert_eq!(outcomes["T0"].vm(), Some("B"));
        assert_eq!(outcomes["T3"].vm(), Some("B"));
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_total_loss_fails_each_task() {
        let (mut vms, mut tasks) = setup(&["A"], &[("T0", "A"), ("T1", "A")]);
        vms.mark_failed("A").unwrap();
        let mut cursor = RoundRobinCursor::at(2);
        let outcomes = ReassignmentEngine::default().reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["T0", "T1"]),
            "A",
        );
        assert_eq!(outcomes.len(), 2);
        for (task_id, outcome) in &outcomes {
            match outcome {
                Reassignment::Failed(err) => assert!(err.is_capacity_loss()),
                other => panic!("unexpected outcome {other:?}"),
            }
            let task = tasks.get(task_id).unwrap();
            assert_eq!(task.status, TaskStatus::Failed);
            assert_eq!(task.assigned_vm, None);
        }
    }

    #[test]
    fn test_previously_failed_vms_are_excluded() {
        let (mut vms, mut tasks) = setup(&["A", "B", "C"], &[("T0", "A"), ("T1", "B")]);
        vms.mark_failed("C").unwrap();
        vms.mark_failed("B").unwrap();
        let mut cursor = RoundRobinCursor::at(1);
        let outcomes = ReassignmentEngine::default().reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["T1"]),
            "B",
        );
        assert_eq!(outcomes["T1"].vm(), Some("A"));
    }

    #[test]
    fn test_unknown_orphan_is_reported() {
        let (mut vms, mut tasks) = setup(&["A", "B"], &[("T0", "A")]);
        vms.mark_failed("A").unwrap();
        let mut cursor = RoundRobinCursor::new();
        let outcomes = ReassignmentEngine::default().reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["ghost", "T0"]),
            "A",
        );
        assert_eq!(
            outcomes["ghost"],
            Reassignment::Failed(SchedulerError::task_not_found("ghost"))
        );
        assert_eq!(outcomes["T0"].vm(), Some("B"));
    }

    #[test]
    fn test_finished_tasks_are_left_alone() {
        let (mut vms, mut tasks) = setup(&["A", "B"], &[("T0", "A"), ("T1", "B"), ("T2", "A")]);
        for (task_id, status) in [("T0", CompletionStatus::Completed), ("T2", CompletionStatus::Failed)] {
            tasks
                .record_completion(&CompletionNotice {
                    task_id: task_id.to_string(),
                    status,
                    exec_start: 0.1,
                    finish_time: 1.1,
                })
                .unwrap();
        }
        vms.mark_failed("A").unwrap();
        let mut cursor = RoundRobinCursor::at(3);
        let outcomes = ReassignmentEngine::default().reassign(
            &vms,
            &mut tasks,
            &mut cursor,
            &orphans(&["T0", "T2"]),
            "A",
        );
        assert_eq!(outcomes["T0"], Reassignment::Untouched(TaskStatus::Completed));
        assert_eq!(outcomes["T2"], Reassignment::Untouched(TaskStatus::Failed));
        let t0 = tasks.get("T0").unwrap();
        assert_eq!(t0.status, TaskStatus::Completed);
        assert_eq!(t0.finish_time, Some(1.1));
        assert_eq!(t0.reassignments, 0);
        assert_eq!(cursor.position(), 3);
    }
}
