//! Stand-in execution engine
//!
//! Plays the part of the simulation engine: every VM runs the cloudlets bound
//! to it one after another, starting at the configured start time. CPU time is
//! `length / (mips * pes)`. Cloudlets without a binding never run and get no
//! notice; a cloudlet bound to a VM that is down is reported as failed.

use std::collections::HashMap;

use log::{debug, warn};
use vm_scheduler::{CompletionNotice, CompletionStatus, TaskRegistry, TaskStatus, VmRegistry};

#[derive(Debug, Clone, Copy)]
pub struct ExecutionEngine {
    start_time: f64,
}

impl ExecutionEngine {
    pub fn new(start_time: f64) -> Self {
        ExecutionEngine { start_time }
    }

    /// Execute every bound task and return one notice per executed task, in
    /// submission order
    pub fn run(&self, vms: &VmRegistry, tasks: &TaskRegistry) -> Vec<CompletionNotice> {
        let mut clocks: HashMap<&str, f64> = HashMap::new();
        let mut notices = Vec::new();

        for task in tasks.iter() {
            if task.status != TaskStatus::Assigned {
                continue;
            }
            let Some(vm_id) = task.assigned_vm.as_deref() else {
                continue;
            };

            let vm = match vms.get(vm_id) {
                Some(vm) if vm.is_active() => vm,
                _ => {
                    warn!("Task {} is bound to unavailable VM {}", task.id, vm_id);
                    notices.push(CompletionNotice {
                        task_id: task.id.clone(),
                        status: CompletionStatus::Failed,
                        exec_start: self.start_time,
                        finish_time: self.start_time,
                    });
                    continue;
                }
            };

            let rate = vm
                .capabilities
                .mips
                .saturating_mul(u64::from(vm.capabilities.pes.max(1)))
                .max(1);
            let cpu_time = task.demand.length as f64 / rate as f64;
            let clock = clocks.entry(vm_id).or_insert(self.start_time);
            let exec_start = *clock;
            *clock += cpu_time;

            debug!(
                "Task {} ran on VM {} from {:.2} to {:.2}",
                task.id, vm_id, exec_start, *clock
            );
            notices.push(CompletionNotice {
                task_id: task.id.clone(),
                status: CompletionStatus::Completed,
                exec_start,
                finish_time: *clock,
            });
        }

        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_scheduler::{Task, Vm, VmCapabilities};

    #[test]
    fn test_tasks_run_back_to_back_per_vm() {
        let mut vms = VmRegistry::new();
        vms.register(Vm::new("A", VmCapabilities::default())).unwrap();
        vms.register(Vm::new(
            "B",
            VmCapabilities {
                mips: 2000,
                ..VmCapabilities::default()
            },
        ))
        .unwrap();
        let mut tasks = TaskRegistry::new();
        for (id, length, vm) in [("0", 5000, "A"), ("1", 4000, "B"), ("2", 1000, "A")] {
            tasks.register(Task::with_length(id, length)).unwrap();
            tasks.assign(id, vm).unwrap();
        }

        let notices = ExecutionEngine::new(0.0).run(&vms, &tasks);
        assert_eq!(notices.len(), 3);
        assert_eq!(notices[0].finish_time, 5.0);
        assert_eq!(notices[1].finish_time, 2.0);
        assert_eq!(notices[2].exec_start, 5.0);
        assert_eq!(notices[2].finish_time, 6.0);
        assert!(notices.iter().all(|n| n.status == CompletionStatus::Completed));
    }

    #[test]
    fn test_failed_and_unbound_tasks() {
        let mut vms = VmRegistry::new();
        vms.register(Vm::new("A", VmCapabilities::default())).unwrap();
        let mut tasks = TaskRegistry::new();
        tasks.register(Task::with_length("0", 1000)).unwrap();
        tasks.register(Task::with_length("1", 1000)).unwrap();
        tasks.assign("0", "A").unwrap();
        vms.mark_failed("A").unwrap();

        let notices = ExecutionEngine::new(0.1).run(&vms, &tasks);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].task_id, "0");
        assert_eq!(notices[0].status, CompletionStatus::Failed);
    }

    #[test]
    fn test_huge_capacity_does_not_overflow() {
        let mut vms = VmRegistry::new();
        vms.register(Vm::new(
            "A",
            VmCapabilities {
                mips: u64::MAX / 2 + 1,
                pes: 2,
                ..VmCapabilities::default()
            },
        ))
        .unwrap();
        let mut tasks = TaskRegistry::new();
        tasks.register(Task::with_length("0", 1000)).unwrap();
        tasks.assign("0", "A").unwrap();

        let notices = ExecutionEngine::new(0.1).run(&vms, &tasks);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].status, CompletionStatus::Completed);
        assert!(notices[0].finish_time >= 0.1);
        assert!(notices[0].finish_time - 0.1 < 1e-9);
    }
}
