use super::comparator::{ArtifactComparisonResult, Comparator, ComparatorError};
use crate::domain::{GoldiffError, GoldiffResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const MISSING_BASELINE_REASON: &str = "Missing baseline artifact";
const MISSING_ACTUAL_REASON: &str = "Missing actual artifact";

/// Locations for one fixture run. Fixture directories are
/// `<root>/<fixture id>/<subdir>` on each side.
#[derive(Debug, Clone)]
pub struct RegressionRunnerConfig {
    pub manifest_path: PathBuf,
    pub policy_path: PathBuf,
    pub baseline_root: PathBuf,
    pub actual_root: PathBuf,
    pub baseline_subdir: String,
    pub actual_subdir: String,
    pub report_path: PathBuf,
}

impl Default for RegressionRunnerConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("test-data/golden-manifest.json"),
            policy_path: PathBuf::from("test-data/comparison-policy.json"),
            baseline_root: PathBuf::from("test-data/fixtures"),
            actual_root: PathBuf::from("test-data/fixtures"),
            baseline_subdir: "expected-output".to_string(),
            actual_subdir: "output".to_string(),
            report_path: PathBuf::from("test-data/regression-report.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionRunReport {
    pub generated_at_unix_seconds: u64,
    pub passed: bool,
    pub manifest_path: String,
    pub policy_path: String,
    pub baseline_root: String,
    pub actual_root: String,
    pub baseline_subdir: String,
    pub actual_subdir: String,
    pub fixture_count: usize,
    pub passed_fixture_count: usize,
    pub failed_fixture_count: usize,
    pub artifact_count: usize,
    pub passed_artifact_count: usize,
    pub failed_artifact_count: usize,
    pub fixtures: Vec<FixtureRegressionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureRegressionReport {
    pub fixture_id: String,
    pub passed: bool,
    pub artifact_count: usize,
    pub passed_artifact_count: usize,
    pub failed_artifact_count: usize,
    pub artifacts: Vec<ArtifactRegressionReport>,
}

impl FixtureRegressionReport {
    pub fn first_failure(&self) -> Option<&ArtifactRegressionReport> {
        self.artifacts.iter().find(|artifact| !artifact.passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRegressionReport {
    pub artifact_path: String,
    pub baseline_path: String,
    pub actual_path: String,
    pub passed: bool,
    pub reason: Option<String>,
    pub comparison: Option<ArtifactComparisonResult>,
}

/// Compares every fixture in the manifest and writes the JSON report.
pub fn run_regression(config: &RegressionRunnerConfig) -> GoldiffResult<RegressionRunReport> {
    let manifest = load_manifest(&config.manifest_path).map_err(GoldiffError::from)?;
    let comparator = Comparator::from_policy_path(&config.policy_path)
        .map_err(|source| GoldiffError::from(RegressionRunnerError::Comparator(source)))?;
    info!(
        fixtures = manifest.fixtures.len(),
        manifest = %config.manifest_path.display(),
        "starting regression run"
    );

    let fixtures = manifest
        .fixtures
        .iter()
        .map(|fixture| compare_fixture(config, fixture, &comparator))
        .collect::<Result<Vec<_>, _>>()
        .map_err(GoldiffError::from)?;

    let fixture_count = fixtures.len();
    let passed_fixture_count = fixtures.iter().filter(|fixture| fixture.passed).count();
    let artifact_count = fixtures
        .iter()
        .map(|fixture| fixture.artifact_count)
        .sum::<usize>();
    let passed_artifact_count = fixtures
        .iter()
        .map(|fixture| fixture.passed_artifact_count)
        .sum::<usize>();
    let failed_fixture_count = fixture_count - passed_fixture_count;

    let report = RegressionRunReport {
        generated_at_unix_seconds: current_unix_timestamp_seconds(),
        passed: failed_fixture_count == 0,
        manifest_path: normalize_path(&config.manifest_path),
        policy_path: normalize_path(&config.policy_path),
        baseline_root: normalize_path(&config.baseline_root),
        actual_root: normalize_path(&config.actual_root),
        baseline_subdir: config.baseline_subdir.clone(),
        actual_subdir: config.actual_subdir.clone(),
        fixture_count,
        passed_fixture_count,
        failed_fixture_count,
        artifact_count,
        passed_artifact_count,
        failed_artifact_count: artifact_count - passed_artifact_count,
        fixtures,
    };

    write_report_file(&config.report_path, &report).map_err(GoldiffError::from)?;
    info!(
        passed = report.passed,
        report = %config.report_path.display(),
        "regression report written"
    );
    Ok(report)
}

pub fn render_human_summary(report: &RegressionRunReport) -> String {
    let mut lines = vec![
        format!("Regression status: {}", status_label(report.passed)),
        format!(
            "Fixtures: {} total ({} passed, {} failed)",
            report.fixture_count, report.passed_fixture_count, report.failed_fixture_count
        ),
        format!(
            "Artifacts: {} total ({} passed, {} failed)",
            report.artifact_count, report.passed_artifact_count, report.failed_artifact_count
        ),
    ];

    for fixture in &report.fixtures {
        lines.push(format!(
            "Fixture {}: {} ({}/{} artifacts)",
            fixture.fixture_id,
            status_label(fixture.passed),
            fixture.passed_artifact_count,
            fixture.artifact_count
        ));

        if let Some(failure) = fixture.first_failure() {
            let reason = failure
                .reason
                .as_deref()
                .unwrap_or("artifact comparison failed without a reason");
            lines.push(format!(
                "  first failure: {} ({})",
                failure.artifact_path, reason
            ));
        }
    }

    lines.join("\n")
}

fn status_label(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}

#[derive(Debug, thiserror::Error)]
pub enum RegressionRunnerError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    ReadManifest {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest '{}': {source}", path.display())]
    ParseManifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("comparator setup failed: {0}")]
    Comparator(#[source] ComparatorError),
    #[error("failed to read directory '{}': {source}", path.display())]
    ReadDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create report directory '{}': {source}", path.display())]
    ReportDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report '{}': {source}", path.display())]
    SerializeReport {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write report '{}': {source}", path.display())]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<RegressionRunnerError> for GoldiffError {
    fn from(error: RegressionRunnerError) -> Self {
        let message = error.to_string();
        match error {
            RegressionRunnerError::ReadManifest { .. } => {
                GoldiffError::io_system("IO.REGRESSION_MANIFEST", message)
            }
            RegressionRunnerError::ParseManifest { .. } => {
                GoldiffError::input_validation("INPUT.REGRESSION_MANIFEST", message)
            }
            RegressionRunnerError::Comparator(source) => source.into(),
            RegressionRunnerError::ReadDirectory { .. }
            | RegressionRunnerError::ReportDirectory { .. }
            | RegressionRunnerError::WriteReport { .. } => {
                GoldiffError::io_system("IO.REGRESSION_FILESYSTEM", message)
            }
            RegressionRunnerError::SerializeReport { .. } => {
                GoldiffError::internal("SYS.REGRESSION_REPORT", message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixtureManifest {
    #[serde(default)]
    fixtures: Vec<ManifestFixture>,
}

#[derive(Debug, Deserialize)]
struct ManifestFixture {
    id: String,
}

fn load_manifest(manifest_path: &Path) -> Result<FixtureManifest, RegressionRunnerError> {
    let content = fs::read_to_string(manifest_path).map_err(|source| {
        RegressionRunnerError::ReadManifest {
            path: manifest_path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_str(&content).map_err(|source| RegressionRunnerError::ParseManifest {
        path: manifest_path.to_path_buf(),
        source,
    })
}

fn compare_fixture(
    config: &RegressionRunnerConfig,
    fixture: &ManifestFixture,
    comparator: &Comparator,
) -> Result<FixtureRegressionReport, RegressionRunnerError> {
    let baseline_dir = config
        .baseline_root
        .join(&fixture.id)
        .join(&config.baseline_subdir);
    let actual_dir = config
        .actual_root
        .join(&fixture.id)
        .join(&config.actual_subdir);

    let baseline_files = collect_relative_files(&baseline_dir)?;
    let actual_files = collect_relative_files(&actual_dir)?;

    let placeholder = ".".to_string();
    let mut artifact_paths: BTreeSet<&String> =
        baseline_files.iter().chain(actual_files.iter()).collect();
    if artifact_paths.is_empty() {
        // An empty fixture must not pass silently.
        warn!(fixture = %fixture.id, "fixture has no artifacts on either side");
        artifact_paths.insert(&placeholder);
    }

    let mut artifacts = Vec::with_capacity(artifact_paths.len());
    for artifact_path in artifact_paths {
        let baseline_path = baseline_dir.join(artifact_path);
        let actual_path = actual_dir.join(artifact_path);
        let mut artifact = ArtifactRegressionReport {
            artifact_path: artifact_path.clone(),
            baseline_path: normalize_path(&baseline_path),
            actual_path: normalize_path(&actual_path),
            passed: false,
            reason: None,
            comparison: None,
        };

        if !baseline_files.contains(artifact_path) {
            artifact.reason = Some(MISSING_BASELINE_REASON.to_string());
        } else if !actual_files.contains(artifact_path) {
            artifact.reason = Some(MISSING_ACTUAL_REASON.to_string());
        } else {
            match comparator.compare_artifact(artifact_path, &baseline_path, &actual_path) {
                Ok(comparison) => {
                    artifact.passed = comparison.passed;
                    artifact.reason = comparison.reason.clone();
                    artifact.comparison = Some(comparison);
                }
                Err(error) => {
                    artifact.reason = Some(format!("Comparison error: {error}"));
                }
            }
        }

        debug!(
            fixture = %fixture.id,
            artifact = %artifact.artifact_path,
            passed = artifact.passed,
            "artifact compared"
        );
        artifacts.push(artifact);
    }

    let artifact_count = artifacts.len();
    let passed_artifact_count = artifacts.iter().filter(|artifact| artifact.passed).count();
    let failed_artifact_count = artifact_count - passed_artifact_count;

    Ok(FixtureRegressionReport {
        fixture_id: fixture.id.clone(),
        passed: failed_artifact_count == 0,
        artifact_count,
        passed_artifact_count,
        failed_artifact_count,
        artifacts,
    })
}

/// Sorted relative paths of every file under `root`, or nothing when `root`
/// does not exist.
fn collect_relative_files(root: &Path) -> Result<Vec<String>, RegressionRunnerError> {
    let mut results = Vec::new();
    if root.exists() {
        collect_relative_files_recursive(root, root, &mut results)?;
    }
    results.sort();
    Ok(results)
}

fn collect_relative_files_recursive(
    root: &Path,
    current_dir: &Path,
    results: &mut Vec<String>,
) -> Result<(), RegressionRunnerError> {
    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| RegressionRunnerError::ReadDirectory { path, source }
    };

    for entry in fs::read_dir(current_dir).map_err(read_error(current_dir))? {
        let entry = entry.map_err(read_error(current_dir))?;
        let entry_path = entry.path();
        let file_type = entry.file_type().map_err(read_error(&entry_path))?;

        if file_type.is_dir() {
            collect_relative_files_recursive(root, &entry_path, results)?;
        } else if file_type.is_file() {
            let relative_path = entry_path.strip_prefix(root).unwrap_or(&entry_path);
            results.push(normalize_path(relative_path));
        }
    }

    Ok(())
}

fn write_report_file(
    report_path: &Path,
    report: &RegressionRunReport,
) -> Result<(), RegressionRunnerError> {
    if let Some(parent_dir) = report_path.parent() {
        fs::create_dir_all(parent_dir).map_err(|source| {
            RegressionRunnerError::ReportDirectory {
                path: parent_dir.to_path_buf(),
                source,
            }
        })?;
    }

    let report_json = serde_json::to_string_pretty(report).map_err(|source| {
        RegressionRunnerError::SerializeReport {
            path: report_path.to_path_buf(),
            source,
        }
    })?;
    fs::write(report_path, report_json).map_err(|source| RegressionRunnerError::WriteReport {
        path: report_path.to_path_buf(),
        source,
    })
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
