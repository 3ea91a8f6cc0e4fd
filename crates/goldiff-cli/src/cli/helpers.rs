use super::CliError;
use anyhow::Context;
use goldiff_core::modules::csv_diff::{CsvComparisonReport, MAX_REPORTED_DIFF_LINES};
use goldiff_core::modules::line_set::LineSetReport;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the stderr subscriber. `RUST_LOG` wins unless `verbose` is set.
pub(super) fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    // A subscriber may already be installed when `run` is called more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

pub(super) fn render_line_set_report(report: &LineSetReport) -> String {
    let mut lines = Vec::new();

    if let Some(mismatch) = &report.first_mismatch {
        lines.push("FOUND NON-MATCHING LINES:".to_string());
        lines.push(format!(
            "Output:   {}",
            mismatch.output_line.as_deref().unwrap_or("<missing>")
        ));
        lines.push(format!(
            "Expected: {}",
            mismatch.expected_line.as_deref().unwrap_or("<missing>")
        ));
    }
    if let Some(reason) = report.failure_reason() {
        lines.push(reason);
    }

    lines.push(format!(
        "Comparison status: {} ({} output lines, {} expected lines)",
        status_label(report.passed),
        report.output_line_count,
        report.expected_line_count
    ));
    lines.join("\n")
}

pub(super) fn render_csv_report(
    output_path: &Path,
    expected_path: &Path,
    report: &CsvComparisonReport,
) -> String {
    let mut lines = Vec::new();

    if report.line_count_mismatch() {
        if let Some(reason) = report.failure_reason() {
            lines.push(reason);
        }
    }

    if !report.excerpts.is_empty() {
        lines.push(format!(
            "FOUND NON-MATCHING LINES, SHOWING FIRST {}:",
            MAX_REPORTED_DIFF_LINES
        ));
        for excerpt in &report.excerpts {
            let label = format!("[{}]", excerpt.index);
            lines.push(format!("{label} Output:   {}", excerpt.output_line));
            lines.push(format!(
                "{:width$} Expected: {}",
                "",
                excerpt.expected_line,
                width = label.len()
            ));
        }
    }

    let max_variance = report.max_variance();
    if max_variance > 0.0 {
        lines.push(format!(
            "Max variance seen between {} and {}: {:.10}",
            output_path.display(),
            expected_path.display(),
            max_variance
        ));
    }

    lines.push(format!("Comparison status: {}", status_label(report.passed)));
    lines.join("\n")
}

fn status_label(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}
