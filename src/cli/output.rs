//! CLI output formatting

use crate::{
    core::Status,
    execution::{Fault, RunReport},
    persistence::RunRecord,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a status for display
pub fn format_status(status: Status) -> String {
    match status {
        Status::Pending => style("PENDING").dim().to_string(),
        Status::Running => style("RUNNING").yellow().to_string(),
        Status::Success => style("SUCCESS").green().to_string(),
        Status::Failure => style("FAILURE").red().to_string(),
        Status::Cancel => style("CANCEL").yellow().to_string(),
    }
}

fn status_icon(status: Status) -> Emoji<'static, 'static> {
    match status {
        Status::Success => CHECK,
        Status::Failure => CROSS,
        Status::Running => SPINNER,
        Status::Cancel => WARN,
        Status::Pending => INFO,
    }
}

/// One line per recorded run
pub fn format_run_record(run: &RunRecord) -> String {
    let duration = run
        .ended_at
        .signed_duration_since(run.started_at)
        .to_std()
        .map(format_duration)
        .unwrap_or_else(|_| "-".to_string());

    format!(
        "{} #{} - {} - {} ({})",
        status_icon(run.status),
        style(run.number).cyan(),
        format_status(run.status),
        style(run.started_at.to_rfc3339()).dim(),
        style(duration).dim()
    )
}

pub fn format_fault(fault: &Fault) -> String {
    format!(
        "{} {} {}: {}",
        WARN,
        style(format!("[{}]", fault.scope)).yellow(),
        style(&fault.subject).bold(),
        style(&fault.message).dim()
    )
}

/// Final summary printed after a run
pub fn format_report(report: &RunReport) -> String {
    let elapsed = report
        .finished_at
        .signed_duration_since(report.started_at)
        .to_std()
        .map(format_duration)
        .unwrap_or_else(|_| "-".to_string());

    format!(
        "{} {} finished {} in {}",
        status_icon(report.status),
        style(&report.flow_uri).bold(),
        format_status(report.status),
        style(elapsed).dim()
    )
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
