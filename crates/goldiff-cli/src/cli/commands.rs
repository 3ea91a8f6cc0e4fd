use super::CliError;
use super::helpers::{print_json, render_csv_report, render_line_set_report};
use goldiff_core::domain::{CsvComparisonConfig, DEFAULT_VERSION_MARKER, HeaderMode};
use goldiff_core::modules::csv_diff::compare_output_csvs;
use goldiff_core::modules::line_set::compare_outputs;
use goldiff_core::modules::regression::{
    RegressionRunnerConfig, render_human_summary, run_regression,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct LinesArgs {
    /// Produced output file
    output: PathBuf,

    /// Golden file to compare against
    expected: PathBuf,

    /// Print the comparison report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(super) enum HeaderModeArg {
    /// Any header difference is a real difference
    Compare,
    /// Forgive header differences that only touch the version tag
    IgnoreVersionOnly,
    /// Never compare the header line
    IgnoreAll,
}

impl From<HeaderModeArg> for HeaderMode {
    fn from(value: HeaderModeArg) -> Self {
        match value {
            HeaderModeArg::Compare => Self::Compare,
            HeaderModeArg::IgnoreVersionOnly => Self::IgnoreVersionOnly,
            HeaderModeArg::IgnoreAll => Self::IgnoreAll,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct CsvArgs {
    /// Produced output file
    output: PathBuf,

    /// Golden file to compare against
    expected: PathBuf,

    /// Line index of the first data row; lines between the header and it must match exactly
    #[arg(long, default_value_t = 1)]
    first_data_row: usize,

    /// Header line handling
    #[arg(long = "header", value_enum, default_value_t = HeaderModeArg::Compare)]
    header: HeaderModeArg,

    /// Largest tolerated relative variance for numeric fields (0 means exact)
    #[arg(long, default_value_t = 0.0)]
    max_variance: f64,

    /// Data row index to skip unconditionally (repeatable)
    #[arg(long = "ignore-row", value_name = "ROW")]
    ignore_rows: Vec<usize>,

    /// Tag that precedes the version number in the header line
    #[arg(long, default_value = DEFAULT_VERSION_MARKER)]
    version_marker: String,

    /// Print the comparison report as JSON
    #[arg(long)]
    json: bool,
}

impl CsvArgs {
    fn config(&self) -> CsvComparisonConfig {
        CsvComparisonConfig::new(self.first_data_row, self.header.into(), self.max_variance)
            .with_ignore_rows(self.ignore_rows.iter().copied())
            .with_version_marker(self.version_marker.clone())
    }
}

#[derive(clap::Args)]
pub(super) struct RegressionArgs {
    /// Fixture manifest path
    #[arg(long, default_value = "test-data/golden-manifest.json")]
    manifest: PathBuf,

    /// Comparison policy path
    #[arg(long, default_value = "test-data/comparison-policy.json")]
    policy: PathBuf,

    /// Baseline snapshot root
    #[arg(long, default_value = "test-data/fixtures")]
    baseline_root: PathBuf,

    /// Actual output root
    #[arg(long, default_value = "test-data/fixtures")]
    actual_root: PathBuf,

    /// Baseline subdirectory per fixture
    #[arg(long, default_value = "expected-output")]
    baseline_subdir: String,

    /// Actual subdirectory per fixture
    #[arg(long, default_value = "output")]
    actual_subdir: String,

    /// JSON report output path
    #[arg(long, default_value = "test-data/regression-report.json")]
    report: PathBuf,
}

impl RegressionArgs {
    fn into_config(self) -> RegressionRunnerConfig {
        RegressionRunnerConfig {
            manifest_path: self.manifest,
            policy_path: self.policy,
            baseline_root: self.baseline_root,
            actual_root: self.actual_root,
            baseline_subdir: self.baseline_subdir,
            actual_subdir: self.actual_subdir,
            report_path: self.report,
        }
    }
}

pub(super) fn run_lines_command(args: LinesArgs) -> Result<i32, CliError> {
    let report = compare_outputs(&args.output, &args.expected)
        .map_err(|error| CliError::Compare(error.into()))?;

    if args.json {
        print_json(&report)?;
    } else {
        println!("{}", render_line_set_report(&report));
    }

    Ok(exit_code_for(report.passed))
}

pub(super) fn run_csv_command(args: CsvArgs) -> Result<i32, CliError> {
    let config = args.config();
    config.validate().map_err(CliError::Compare)?;
    debug!(?config, "positional comparison settings");

    let report = compare_output_csvs(&args.output, &args.expected, &config)
        .map_err(|error| CliError::Compare(error.into()))?;

    if args.json {
        print_json(&report)?;
    } else {
        println!(
            "{}",
            render_csv_report(&args.output, &args.expected, &report)
        );
    }

    Ok(exit_code_for(report.passed))
}

pub(super) fn run_regression_command(args: RegressionArgs) -> Result<i32, CliError> {
    let config = args.into_config();
    let report = run_regression(&config).map_err(CliError::Compare)?;
    println!("{}", render_human_summary(&report));
    println!("JSON report: {}", config.report_path.display());

    Ok(exit_code_for(report.passed))
}

fn exit_code_for(passed: bool) -> i32 {
    if passed { 0 } else { 1 }
}
