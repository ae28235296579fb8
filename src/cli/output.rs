//! Output formatting utilities for the CLI.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::models::{RunReport, TerminalState};

/// Spinner shown while the loop runs in human mode.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner
}

/// Render a finished run for human consumption.
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();

    let headline = match &report.terminal_state {
        TerminalState::ConvergedSuccess => style("Converged").green().bold().to_string(),
        TerminalState::ExhaustedIterations => style("Exhausted iterations").yellow().to_string(),
        TerminalState::FatalError { message } => {
            format!("{}: {message}", style("Fatal error").red().bold())
        }
        TerminalState::Cancelled => style("Cancelled").yellow().to_string(),
    };
    out.push_str(&format!(
        "{headline}  (best score {:.1} over {} iteration{})\n\n",
        report.final_quality_score,
        report.iteration_count,
        if report.iteration_count == 1 { "" } else { "s" },
    ));

    if !report.ledger.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Iter", "Score", "Tests", "Lint", "Issues", "Duration"]);
        for record in report.ledger.records() {
            let results = &record.test_outcome.unit_test_results;
            table.add_row(vec![
                Cell::new(record.iteration_index),
                Cell::new(format!("{:.1}", record.quality_score)),
                Cell::new(format!("{}/{}", results.passed, results.passed + results.failed)),
                Cell::new(record.test_outcome.lint_issues.len()),
                Cell::new(record.analysis_outcome.detected_issues.len()),
                Cell::new(format!("{}ms", record.duration_ms)),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    if let Some(implementation) = &report.final_implementation {
        out.push_str(&format!(
            "\nFinal implementation ({}, {} file{}):\n",
            implementation.framework,
            implementation.source_files.len(),
            if implementation.source_files.len() == 1 { "" } else { "s" },
        ));
        for name in implementation.source_files.keys() {
            out.push_str(&format!("  - {name}\n"));
        }
    }

    out
}

/// Print a report in the selected mode.
pub fn print_report(report: &RunReport, json_mode: bool) -> anyhow::Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", render_report(report));
    }
    Ok(())
}
