//! Result reporting
//!
//! The core only assembles a [`SchedulingReport`]; how it is shown is up to a
//! [`Reporter`]. Two renderers ship with the crate: a fixed-width table and
//! pretty JSON.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ReassignmentStrategy;
use crate::protocol::{TaskId, TaskStatus, VmId};
use crate::registry::{TaskRegistry, VmRegistry};

/// How a task ended up where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// Never bound
    Unassigned,
    /// Still on the VM chosen by the initial pass
    Original,
    /// Moved off a failed VM
    Reassigned,
    /// Lost its VM and no active VM was left
    NoCapacity,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Unassigned => "unassigned",
            TaskOutcome::Original => "original",
            TaskOutcome::Reassigned => "reassigned",
            TaskOutcome::NoCapacity => "failed (no capacity)",
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub vm_id: Option<VmId>,
    pub outcome: TaskOutcome,
    pub exec_start: Option<f64>,
    pub finish_time: Option<f64>,
    pub failure: Option<String>,
}

impl TaskRow {
    pub fn cpu_time(&self) -> Option<f64> {
        Some(self.finish_time? - self.exec_start?)
    }
}

/// Counters over all rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub completed: usize,
    pub reassigned: usize,
    pub no_capacity: usize,
}

/// Snapshot of a run for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingReport {
    pub run_id: Uuid,
    pub strategy: ReassignmentStrategy,
    pub failed_vms: Vec<VmId>,
    pub rows: Vec<TaskRow>,
    pub summary: ReportSummary,
}

impl SchedulingReport {
    /// Collect rows in task submission order
    pub fn build(
        run_id: Uuid,
        strategy: ReassignmentStrategy,
        vms: &VmRegistry,
        tasks: &TaskRegistry,
    ) -> Self {
        let rows: Vec<TaskRow> = tasks
            .iter()
            .map(|task| {
                let outcome = match (task.status, &task.assigned_vm) {
                    (TaskStatus::Failed, None) if task.failure.is_some() => TaskOutcome::NoCapacity,
                    (_, None) => TaskOutcome::Unassigned,
                    _ if task.reassignments > 0 => TaskOutcome::Reassigned,
                    _ => TaskOutcome::Original,
                };
                TaskRow {
                    task_id: task.id.clone(),
                    status: task.status,
                    vm_id: task.assigned_vm.clone(),
                    outcome,
                    exec_start: task.exec_start,
                    finish_time: task.finish_time,
                    failure: task.failure.clone(),
                }
            })
            .collect();

        let summary = ReportSummary {
            total: rows.len(),
            completed: rows
                .iter()
                .filter(|row| row.status == TaskStatus::Completed)
                .count(),
            reassigned: rows
                .iter()
                .filter(|row| row.outcome == TaskOutcome::Reassigned)
                .count(),
            no_capacity: rows
                .iter()
                .filter(|row| row.outcome == TaskOutcome::NoCapacity)
                .count(),
        };

        SchedulingReport {
            run_id,
            strategy,
            failed_vms: vms.failed_ids(),
            rows,
            summary,
        }
    }

    pub fn row(&self, task_id: &str) -> Option<&TaskRow> {
        self.rows.iter().find(|row| row.task_id == task_id)
    }
}

/// Renders a report for display
pub trait Reporter {
    fn render(&self, report: &SchedulingReport) -> String;
}

/// Fixed-width text table
#[derive(Debug, Default, Clone, Copy)]
pub struct TableReporter;

fn fmt_time(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "PENDING",
        TaskStatus::Assigned => "ASSIGNED",
        TaskStatus::Completed => "SUCCESS",
        TaskStatus::Failed => "FAILED",
    }
}

impl Reporter for TableReporter {
    fn render(&self, report: &SchedulingReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "========== TASK EXECUTION RESULTS ==========");
        let _ = writeln!(out, "Run: {}", report.run_id);
        if report.failed_vms.is_empty() {
            let _ = writeln!(out, "Failed VMs: none");
        } else {
            let _ = writeln!(out, "Failed VMs: {}", report.failed_vms.join(", "));
        }
        let _ = writeln!(
            out,
            "{:<10} {:<9} {:<8} {:>10} {:>10} {:>10}  {}",
            "Task", "Status", "VM", "CPU Time", "Start", "Finish", "Outcome"
        );
        for row in &report.rows {
            let _ = writeln!(
                out,
                "{:<10} {:<9} {:<8} {:>10} {:>10} {:>10}  {}",
                row.task_id,
                status_label(row.status),
                row.vm_id.as_deref().unwrap_or("-"),
                fmt_time(row.cpu_time()),
                fmt_time(row.exec_start),
                fmt_time(row.finish_time),
                row.outcome.as_str()
            );
        }
        let summary = &report.summary;
        let _ = writeln!(
            out,
            "Tasks: {} total, {} completed, {} reassigned, {} failed with no capacity",
            summary.total, summary.completed, summary.reassigned, summary.no_capacity
        );
        out
    }
}

/// Pretty-printed JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn render(&self, report: &SchedulingReport) -> String {
        serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"report serialization failed: {e}\"}}"))
    }
}
