//! VM registry

use std::collections::HashMap;

use crate::error::{SchedulerError, SchedulerResult};
use crate::protocol::{Vm, VmId, VmStatus};

/// Pool of VMs in registration order with an id index for O(1) lookups
#[derive(Debug, Default, Clone)]
pub struct VmRegistry {
    vms: Vec<Vm>,
    index: HashMap<VmId, usize>,
}

impl VmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a VM. It always enters the pool as Active.
    pub fn register(&mut self, mut vm: Vm) -> SchedulerResult<()> {
        if self.index.contains_key(&vm.id) {
            return Err(SchedulerError::duplicate_vm(&vm.id));
        }
        vm.status = VmStatus::Active;
        self.index.insert(vm.id.clone(), self.vms.len());
        self.vms.push(vm);
        Ok(())
    }

    /// Transition a VM to Failed.
    ///
    /// Failing an already failed VM is an error so that double injection
    /// surfaces instead of being absorbed.
    pub fn mark_failed(&mut self, id: &str) -> SchedulerResult<()> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| SchedulerError::vm_not_found(id))?;
        let vm = &mut self.vms[slot];
        if vm.status == VmStatus::Failed {
            return Err(SchedulerError::AlreadyFailed(vm.id.clone()));
        }
        vm.status = VmStatus::Failed;
        Ok(())
    }

    /// Active VMs in registration order
    pub fn list_active(&self) -> Vec<&Vm> {
        self.vms.iter().filter(|vm| vm.is_active()).collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).is_some_and(Vm::is_active)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Vm> {
        self.index.get(id).map(|&slot| &self.vms[slot])
    }

    /// Every VM id, failed or not, in registration order
    pub fn ids(&self) -> Vec<VmId> {
        self.vms.iter().map(|vm| vm.id.clone()).collect()
    }

    pub fn failed_ids(&self) -> Vec<VmId> {
        self.vms
            .iter()
            .filter(|vm| !vm.is_active())
            .map(|vm| vm.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vm> {
        self.vms.iter()
    }

    pub fn len(&self) -> usize {
        self.vms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::VmCapabilities;

    fn registry(ids: &[&str]) -> VmRegistry {
        let mut registry = VmRegistry::new();
        for id in ids {
            registry
                .register(Vm::new(*id, VmCapabilities::default()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = registry(&["A"]);
        let err = registry
            .register(Vm::new("A", VmCapabilities::default()))
            .unwrap_err();
        assert_eq!(err, SchedulerError::duplicate_vm("A"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_resets_status() {
        let mut vm = Vm::new("A", VmCapabilities::default());
        vm.status = VmStatus::Failed;
        let mut registry = VmRegistry::new();
        registry.register(vm).unwrap();
        assert!(registry.is_active("A"));
    }

    #[test]
    fn test_mark_failed() {
        let mut registry = registry(&["A", "B", "C"]);
        registry.mark_failed("B").unwrap();
        assert!(!registry.is_active("B"));
        assert!(registry.is_active("A"));
        assert_eq!(registry.failed_ids(), vec!["B".to_string()]);
    }

    #[test]
    fn test_mark_failed_twice() {
        let mut registry = registry(&["A"]);
        registry.mark_failed("A").unwrap();
        assert_eq!(
            registry.mark_failed("A"),
            Err(SchedulerError::AlreadyFailed("A".to_string()))
        );
    }

    #[test]
    fn test_mark_failed_unknown() {
        let mut registry = registry(&["A"]);
        assert_eq!(
            registry.mark_failed("Z"),
            Err(SchedulerError::vm_not_found("Z"))
        );
    }

    #[test]
    fn test_list_active_keeps_registration_order() {
        let mut registry = registry(&["C", "A", "B", "D"]);
        registry.mark_failed("A").unwrap();
        let active: Vec<&str> = registry
            .list_active()
            .iter()
            .map(|vm| vm.id.as_str())
            .collect();
        assert_eq!(active, vec!["C", "B", "D"]);
        assert_eq!(registry.ids(), vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_is_active_unknown() {
        let registry = registry(&["A"]);
        assert!(!registry.is_active("missing"));
    }
}
