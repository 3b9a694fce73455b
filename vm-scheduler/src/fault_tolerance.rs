//! Fault injection
//!
//! Failing a VM is a single registry transition. The injector reports which
//! tasks were sitting on the VM but leaves them alone; moving them is the
//! reassignment engine's job.

use log::warn;

use crate::error::SchedulerResult;
use crate::protocol::TaskId;
use crate::registry::{TaskRegistry, VmRegistry};

/// Marks VMs failed and collects the tasks they orphan
#[derive(Debug, Default, Clone, Copy)]
pub struct FaultInjector;

impl FaultInjector {
    pub fn new() -> Self {
        FaultInjector
    }

    /// Fail `vm_id` and return the tasks bound to it, in submission order.
    ///
    /// Errors with `NotFound` or `AlreadyFailed` exactly like
    /// [`VmRegistry::mark_failed`]; in that case nothing changes.
    pub fn inject(
        &self,
        vms: &mut VmRegistry,
        tasks: &TaskRegistry,
        vm_id: &str,
    ) -> SchedulerResult<Vec<TaskId>> {
        vms.mark_failed(vm_id)?;
        let orphans = tasks.tasks_bound_to(vm_id);
        warn!(
            "VM {} marked as FAILED, {} task(s) orphaned: {:?}",
            vm_id,
            orphans.len(),
            orphans
        );
        Ok(orphans)
    }
}
