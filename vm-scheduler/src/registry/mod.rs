//! Registries owning the VMs and tasks of one run
//!
//! Both registries keep insertion order, which is what makes round-robin
//! placement and reassignment order deterministic.

pub mod resource;
pub mod task;

pub use resource::VmRegistry;
pub use task::TaskRegistry;
