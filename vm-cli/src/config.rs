//! Simulation configuration
//!
//! A run is described by its VMs, its cloudlets and an optional fault. The
//! description comes either from a built-in preset or from a TOML file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use vm_scheduler::{SchedulerConfig, Task, TaskDemand, Vm, VmCapabilities, VmId};

/// VM template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSpec {
    pub id: VmId,
    #[serde(default = "default_mips")]
    pub mips: u64,
    #[serde(default = "default_pes")]
    pub pes: u32,
    #[serde(default = "default_ram")]
    pub ram_mb: u64,
    #[serde(default = "default_bw")]
    pub bandwidth: u64,
    #[serde(default = "default_storage")]
    pub storage_mb: u64,
    #[serde(default = "default_vmm")]
    pub vmm: String,
}

fn default_mips() -> u64 {
    1000
}

fn default_pes() -> u32 {
    1
}

fn default_ram() -> u64 {
    2048
}

fn default_bw() -> u64 {
    1000
}

fn default_storage() -> u64 {
    10000
}

fn default_vmm() -> String {
    "Xen".to_string()
}

impl VmSpec {
    pub fn new(id: impl Into<VmId>) -> Self {
        VmSpec {
            id: id.into(),
            mips: default_mips(),
            pes: default_pes(),
            ram_mb: default_ram(),
            bandwidth: default_bw(),
            storage_mb: default_storage(),
            vmm: default_vmm(),
        }
    }

    pub fn to_vm(&self) -> Vm {
        Vm::new(
            self.id.clone(),
            VmCapabilities {
                mips: self.mips,
                pes: self.pes,
                ram_mb: self.ram_mb,
                bandwidth: self.bandwidth,
                storage_mb: self.storage_mb,
                vmm: self.vmm.clone(),
            },
        )
    }
}

/// Cloudlet template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudletSpec {
    pub id: String,
    pub length: u64,
    #[serde(default = "default_pes")]
    pub pes: u32,
    #[serde(default = "default_io_size")]
    pub file_size: u64,
    #[serde(default = "default_io_size")]
    pub output_size: u64,
}

fn default_io_size() -> u64 {
    300
}

impl CloudletSpec {
    pub fn new(id: impl Into<String>, length: u64) -> Self {
        CloudletSpec {
            id: id.into(),
            length,
            pes: default_pes(),
            file_size: default_io_size(),
            output_size: default_io_size(),
        }
    }

    pub fn to_task(&self) -> Task {
        Task::new(
            self.id.clone(),
            TaskDemand {
                length: self.length,
                pes: self.pes,
                file_size: self.file_size,
                output_size: self.output_size,
            },
        )
    }
}

/// When the fault fires relative to the initial assignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultPhase {
    /// The VM is down before any task is placed
    BeforeAssignment,
    /// The VM fails after placement and its tasks are reassigned
    #[default]
    AfterAssignment,
}

impl std::str::FromStr for FaultPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "before" | "before-assignment" => Ok(FaultPhase::BeforeAssignment),
            "after" | "after-assignment" => Ok(FaultPhase::AfterAssignment),
            other => bail!("unknown fault phase: {other}"),
        }
    }
}

/// Fault injection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub enabled: bool,
    /// VM to fail; picked at random when unset
    pub vm: Option<VmId>,
    /// Seed for the random pick
    pub seed: Option<u64>,
    pub phase: FaultPhase,
}

impl FaultConfig {
    /// Resolve which VM fails, if any
    pub fn select_vm(&self, vm_ids: &[VmId]) -> Option<VmId> {
        if !self.enabled {
            return None;
        }
        if let Some(vm) = &self.vm {
            return Some(vm.clone());
        }
        if vm_ids.is_empty() {
            return None;
        }
        let index = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed).gen_range(0..vm_ids.len()),
            None => rand::thread_rng().gen_range(0..vm_ids.len()),
        };
        Some(vm_ids[index].clone())
    }
}

/// Full description of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub name: String,
    /// Time the execution engine starts running cloudlets
    #[serde(default = "default_start_time")]
    pub start_time: f64,
    pub vms: Vec<VmSpec>,
    pub cloudlets: Vec<CloudletSpec>,
    #[serde(default)]
    pub fault: FaultConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_start_time() -> f64 {
    0.1
}

impl SimulationConfig {
    /// Five VMs, five healthcare cloudlets (diagnosis, report, alert and two
    /// more), one VM failing after placement.
    pub fn healthcare() -> Self {
        SimulationConfig {
            name: "healthcare".to_string(),
            start_time: default_start_time(),
            vms: (0..5).map(|i| VmSpec::new(i.to_string())).collect(),
            cloudlets: [5000, 3000, 1000, 2000, 4000]
                .iter()
                .enumerate()
                .map(|(i, &length)| CloudletSpec::new(i.to_string(), length))
                .collect(),
            fault: FaultConfig {
                enabled: true,
                phase: FaultPhase::AfterAssignment,
                ..FaultConfig::default()
            },
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Five small VMs, ten equal cloudlets, one VM down from the start.
    pub fn smart_healthcare() -> Self {
        SimulationConfig {
            name: "smart-healthcare".to_string(),
            start_time: default_start_time(),
            vms: (0..5)
                .map(|i| VmSpec {
                    ram_mb: 512,
                    ..VmSpec::new(i.to_string())
                })
                .collect(),
            cloudlets: (0..10)
                .map(|i| CloudletSpec::new(i.to_string(), 4000))
                .collect(),
            fault: FaultConfig {
                enabled: true,
                phase: FaultPhase::BeforeAssignment,
                ..FaultConfig::default()
            },
            scheduler: SchedulerConfig::default(),
        }
    }

    /// One VM, one cloudlet, no fault.
    pub fn simple() -> Self {
        SimulationConfig {
            name: "simple".to_string(),
            start_time: default_start_time(),
            vms: vec![VmSpec {
                ram_mb: 1024,
                ..VmSpec::new("0")
            }],
            cloudlets: vec![CloudletSpec {
                file_size: 500,
                output_size: 1000,
                ..CloudletSpec::new("0", 1000)
            }],
            fault: FaultConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "healthcare" => Ok(Self::healthcare()),
            "smart-healthcare" => Ok(Self::smart_healthcare()),
            "simple" => Ok(Self::simple()),
            other => bail!("unknown preset: {other} (expected healthcare, smart-healthcare or simple)"),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid simulation config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    pub fn vm_ids(&self) -> Vec<VmId> {
        self.vms.iter().map(|vm| vm.id.clone()).collect()
    }
}
