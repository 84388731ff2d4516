//! Terminal rendering of flow progress
//!
//! [`TerminalOutput`] turns [`FlowEvent`]s into stage headers such as
//! `[2/4] build` with a separator line between stages.

use crate::cli::output::{format_status, CHECK, CROSS, ROCKET, WARN};
use crate::core::Status;
use crate::execution::FlowEvent;
use console::style;
use std::io::{self, Write};

/// Prints flow events as they arrive
#[derive(Debug, Clone, Copy)]
pub struct TerminalOutput {
    total_stages: usize,
}

impl TerminalOutput {
    pub fn new(total_stages: usize) -> Self {
        Self { total_stages }
    }

    pub fn on_event(&self, event: &FlowEvent) {
        match event {
            FlowEvent::FlowStarted { execution_id, uri } => {
                println!(
                    "{} Starting flow {} ({})",
                    ROCKET,
                    style(uri).bold(),
                    style(&execution_id.to_string()[..8]).dim()
                );
            }
            FlowEvent::StageStarted { index, name } => {
                self.print_separator();
                println!("{}", stage_header(*index, self.total_stages, name));
            }
            FlowEvent::StageFinished { name, status, .. } => {
                let icon = match status {
                    Status::Success => CHECK,
                    Status::Cancel => WARN,
                    _ => CROSS,
                };
                println!("{} {} {}", icon, style(name).bold(), format_status(*status));
            }
            FlowEvent::FlowFinished { .. } => {
                self.print_separator();
            }
        }
        self.flush_stdout();
    }

    fn print_separator(&self) {
        // Get terminal width, default to 80 if unavailable
        let width = term_size::dimensions_stdout()
            .map(|(w, _)| w)
            .unwrap_or(80);
        println!("{}", style(separator(width)).dim());
    }

    fn flush_stdout(&self) {
        let _ = io::stdout().flush();
    }
}

/// `[N/M] name`, with N counted from one
pub fn stage_header(index: usize, total: usize, name: &str) -> String {
    format!(
        "[{}/{}] {}",
        style(index + 1).cyan(),
        style(total).dim(),
        style(name).bold()
    )
}

pub fn separator(width: usize) -> String {
    "─".repeat(width)
}
