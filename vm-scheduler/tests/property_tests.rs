//! Property tests for round-robin placement and reassignment

use proptest::prelude::*;
use vm_scheduler::{SchedulerConfig, Task, TaskScheduler, TaskStatus, Vm, VmCapabilities};

fn build(vm_count: usize, task_count: usize) -> TaskScheduler {
    let mut scheduler = TaskScheduler::new(SchedulerConfig::default());
    scheduler
        .submit_vms(
            (0..vm_count)
                .map(|i| Vm::new(format!("vm-{i}"), VmCapabilities::default()))
                .collect(),
        )
        .unwrap();
    scheduler
        .submit_tasks(
            (0..task_count)
                .map(|i| Task::with_length(format!("task-{i}"), 1000))
                .collect(),
        )
        .unwrap();
    scheduler
}

proptest! {
    #[test]
    fn prop_initial_assignment_is_index_mod_m(vm_count in 1usize..12, task_count in 0usize..64) {
        let mut scheduler = build(vm_count, task_count);
        let mapping = scheduler.run_initial_assignment().unwrap();
        prop_assert_eq!(mapping.len(), task_count);
        for i in 0..task_count {
            let expected = format!("vm-{}", i % vm_count);
            prop_assert_eq!(&mapping[&format!("task-{i}")], &expected);
        }
    }
}

proptest! {
    #[test]
    fn prop_reassignment_avoids_failed_vms(
        vm_count in 1usize..10,
        task_count in 1usize..50,
        failures in proptest::collection::vec(0usize..10, 1..4),
    ) {
        let mut scheduler = build(vm_count, task_count);
        scheduler.run_initial_assignment().unwrap();

        for index in failures {
            let vm_id = format!("vm-{}", index % vm_count);
            if !scheduler.vms().is_active(&vm_id) {
                continue;
            }
            let before = scheduler.tasks().tasks_bound_to(&vm_id);
            let orphans = scheduler.inject_failure(&vm_id).unwrap();
            prop_assert_eq!(&orphans, &before);

            let outcomes = scheduler.reassign(&orphans, &vm_id);
            prop_assert_eq!(outcomes.len(), orphans.len());
            for (task_id, outcome) in &outcomes {
                match outcome.vm() {
                    Some(vm) => {
                        prop_assert!(scheduler.vms().is_active(vm));
                    }
                    None => {
                        prop_assert!(scheduler.vms().list_active().is_empty());
                        prop_assert_eq!(
                            scheduler.tasks().get(task_id).unwrap().status,
                            TaskStatus::Failed
                        );
                    }
                }
            }
            prop_assert!(scheduler.tasks().tasks_bound_to(&vm_id).is_empty());
        }

        for vm in scheduler.assignments().values() {
            prop_assert!(scheduler.vms().is_active(vm));
        }
    }
}

proptest! {
    #[test]
    fn prop_initial_assignment_is_deterministic(vm_count in 1usize..8, task_count in 0usize..40) {
        let mut first = build(vm_count, task_count);
        let mut second = build(vm_count, task_count);
        let a = first.run_initial_assignment().unwrap();
        let b = first.run_initial_assignment().unwrap();
        let c = second.run_initial_assignment().unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}
