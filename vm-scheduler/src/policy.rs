//! Round-robin placement
//!
//! A rotating cursor walks an ordered list of candidate VMs. For each task the
//! cursor skips excluded candidates, binds the task to the first one it lands
//! on and then moves one step further. A task never probes more than
//! `candidates.len()` slots, so a fully excluded pool ends in
//! `NoAvailableResource` instead of spinning.

use std::collections::HashSet;

use crate::error::{SchedulerError, SchedulerResult};
use crate::protocol::{TaskId, VmId};

/// Rotating cursor state for round-robin placement
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobinCursor {
    position: usize,
}

impl RoundRobinCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: usize) -> Self {
        RoundRobinCursor { position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Pick a VM for one task.
    ///
    /// On failure the cursor is left where it was.
    pub fn pick(
        &mut self,
        task_id: &str,
        candidates: &[VmId],
        excluded: &HashSet<VmId>,
    ) -> SchedulerResult<VmId> {
        let len = candidates.len();
        for probe in 0..len {
            let slot = (self.position + probe) % len;
            let candidate = &candidates[slot];
            if !excluded.contains(candidate) {
                self.position += probe + 1;
                return Ok(candidate.clone());
            }
        }
        Err(SchedulerError::NoAvailableResource {
            task_id: Some(task_id.to_string()),
        })
    }

    /// Place every task in order, or none of them.
    ///
    /// The cursor only moves if the whole plan succeeds.
    pub fn plan(
        &mut self,
        tasks: &[TaskId],
        candidates: &[VmId],
        excluded: &HashSet<VmId>,
    ) -> SchedulerResult<Vec<(TaskId, VmId)>> {
        let mut cursor = *self;
        let mut placements = Vec::with_capacity(tasks.len());
        for task_id in tasks {
            let vm_id = cursor.pick(task_id, candidates, excluded)?;
            placements.push((task_id.clone(), vm_id));
        }
        *self = cursor;
        Ok(placements)
    }
}

/// First candidate in order that is not excluded
pub fn first_available<'a>(candidates: &'a [VmId], excluded: &HashSet<VmId>) -> Option<&'a VmId> {
    candidates.iter().find(|candidate| !excluded.contains(*candidate))
}
