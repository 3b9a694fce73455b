use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use log::{error, info, warn};
use vm_scheduler::{
    JsonReporter, Reassignment, ReassignmentStrategy, Reporter, TableReporter, TaskScheduler,
};

mod config;
mod execution;

use config::{FaultPhase, SimulationConfig};
use execution::ExecutionEngine;

struct CliArgs {
    preset: String,
    config: Option<PathBuf>,
    fail_vm: Option<String>,
    seed: Option<u64>,
    fault_phase: Option<FaultPhase>,
    no_fault: bool,
    strategy: Option<ReassignmentStrategy>,
    json: bool,
    debug: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            preset: "healthcare".to_string(),
            config: None,
            fail_vm: None,
            seed: None,
            fault_phase: None,
            no_fault: false,
            strategy: None,
            json: false,
            debug: false,
        }
    }
}

fn parse_args() -> CliArgs {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--preset" | "-p" => {
                if let Some(name) = iter.next() {
                    args.preset = name;
                }
            }
            "--config" | "-c" => {
                if let Some(path) = iter.next() {
                    args.config = Some(PathBuf::from(path));
                }
            }
            "--fail-vm" | "-f" => {
                args.fail_vm = iter.next();
            }
            "--seed" | "-s" => {
                if let Some(v) = iter.next() {
                    match parse_seed(&v) {
                        Ok(seed) => args.seed = Some(seed),
                        Err(e) => usage_error(&e),
                    }
                }
            }
            "--fault-phase" => {
                if let Some(v) = iter.next() {
                    match v.parse() {
                        Ok(phase) => args.fault_phase = Some(phase),
                        Err(e) => usage_error(&e.to_string()),
                    }
                }
            }
            "--no-fault" => {
                args.no_fault = true;
            }
            "--strategy" => {
                if let Some(v) = iter.next() {
                    match v.parse() {
                        Ok(strategy) => args.strategy = Some(strategy),
                        Err(e) => usage_error(&e),
                    }
                }
            }
            "--json" => {
                args.json = true;
            }
            "--debug" => {
                args.debug = true;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            _ => usage_error(&format!("Unknown argument: {}", arg)),
        }
    }

    args
}

fn parse_seed(value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|e| format!("Invalid seed '{}': {}", value, e))
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message);
    print_usage();
    process::exit(1);
}

fn print_usage() {
    println!("Fault-tolerant VM task scheduling simulation");
    println!();
    println!("USAGE:");
    println!("    vm-sched [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -p, --preset <NAME>      healthcare, smart-healthcare or simple [default: healthcare]");
    println!("    -c, --config <PATH>      Load the run from a TOML file instead of a preset");
    println!("    -f, --fail-vm <ID>       Fail this VM (enables fault injection)");
    println!("    -s, --seed <N>           Seed for picking the failing VM at random");
    println!("    --fault-phase <PHASE>    before or after the initial assignment");
    println!("    --no-fault               Disable fault injection");
    println!("    --strategy <NAME>        continue-cursor or first-available");
    println!("    --json                   Print the report as JSON");
    println!("    --debug                  Enable debug output");
    println!("    -h, --help               Print this help message");
}

fn load_config(args: &CliArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::preset(&args.preset)?,
    };

    if let Some(vm) = &args.fail_vm {
        config.fault.enabled = true;
        config.fault.vm = Some(vm.clone());
    }
    if let Some(seed) = args.seed {
        config.fault.seed = Some(seed);
    }
    if let Some(phase) = args.fault_phase {
        config.fault.phase = phase;
    }
    if args.no_fault {
        config.fault.enabled = false;
    }
    if let Some(strategy) = args.strategy {
        config.scheduler.fault_tolerance.reassignment_strategy = strategy;
    }
    Ok(config)
}

fn log_reassignments(outcomes: &std::collections::BTreeMap<String, Reassignment>) {
    for (task_id, outcome) in outcomes {
        match outcome {
            Reassignment::Moved(vm_id) => info!("Task {} reassigned to VM {}", task_id, vm_id),
            Reassignment::Failed(err) => warn!("Task {} permanently failed: {}", task_id, err),
            Reassignment::Untouched(status) => {
                info!("Task {} already finished ({:?}), left in place", task_id, status)
            }
        }
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = load_config(args)?;
    info!(
        "=== Simulation '{}': {} VM(s), {} cloudlet(s) ===",
        config.name,
        config.vms.len(),
        config.cloudlets.len()
    );

    let mut scheduler = TaskScheduler::new(config.scheduler.clone());
    info!("Run id: {}", scheduler.run_id());
    scheduler
        .submit_vms(config.vms.iter().map(|vm| vm.to_vm()).collect())
        .context("failed to submit VMs")?;
    scheduler
        .submit_tasks(config.cloudlets.iter().map(|c| c.to_task()).collect())
        .context("failed to submit cloudlets")?;

    let failing_vm = config.fault.select_vm(&config.vm_ids());

    if let (Some(vm_id), FaultPhase::BeforeAssignment) = (&failing_vm, config.fault.phase) {
        info!("Simulating failure of VM {} before assignment", vm_id);
        scheduler
            .inject_failure(vm_id)
            .with_context(|| format!("failed to inject fault on VM {vm_id}"))?;
    }

    let mapping = scheduler
        .run_initial_assignment()
        .context("initial assignment failed")?;
    for (task_id, vm_id) in &mapping {
        info!("Task {} bound to VM {}", task_id, vm_id);
    }

    if let (Some(vm_id), FaultPhase::AfterAssignment) = (&failing_vm, config.fault.phase) {
        info!("Simulating failure of VM {}", vm_id);
        let outcomes = scheduler
            .recover_from_failure(vm_id)
            .with_context(|| format!("failed to inject fault on VM {vm_id}"))?;
        log_reassignments(&outcomes);
    }

    let engine = ExecutionEngine::new(config.start_time);
    for notice in engine.run(scheduler.vms(), scheduler.tasks()) {
        scheduler
            .record_completion(notice)
            .context("failed to record completion")?;
    }

    let report = scheduler.report();
    let rendered = if args.json {
        JsonReporter.render(&report)
    } else {
        TableReporter.render(&report)
    };
    println!("{}", rendered);

    info!("Simulation finished.");
    Ok(())
}

fn main() {
    let args = parse_args();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        process::exit(1);
    }
}
