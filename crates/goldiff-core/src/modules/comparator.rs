use super::csv_diff::{CsvComparisonReport, compare_output_csvs};
use super::line_set::{LineSetReport, compare_outputs};
use crate::domain::{CsvComparisonConfig, GoldiffError};
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Chooses a comparison strategy per artifact from a JSON policy.
pub struct Comparator {
    default_mode: ComparisonMode,
    default_csv: CsvComparisonConfig,
    categories: Vec<CompiledCategory>,
}

struct CompiledCategory {
    id: String,
    mode: ComparisonMode,
    csv: CsvComparisonConfig,
    matchers: Vec<GlobMatcher>,
}

impl CompiledCategory {
    fn matches(&self, artifact_path: &str) -> bool {
        let path = Path::new(artifact_path);
        self.matchers.iter().any(|matcher| matcher.is_match(path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    LineSet,
    PositionalCsv,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRule {
    pub mode: ComparisonMode,
    pub category_id: Option<String>,
    pub csv: CsvComparisonConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactComparisonResult {
    pub artifact_path: String,
    pub mode: ComparisonMode,
    pub matched_category: Option<String>,
    pub passed: bool,
    pub reason: Option<String>,
    pub metrics: ArtifactComparisonMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactComparisonMetrics {
    LineSet(LineSetReport),
    PositionalCsv(PositionalCsvMetrics),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalCsvMetrics {
    pub config: CsvComparisonConfig,
    pub report: CsvComparisonReport,
}

#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub artifact_path: PathBuf,
    pub baseline_path: PathBuf,
    pub actual_path: PathBuf,
}

impl ArtifactPair {
    pub fn new(
        artifact_path: impl Into<PathBuf>,
        baseline_path: impl Into<PathBuf>,
        actual_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            baseline_path: baseline_path.into(),
            actual_path: actual_path.into(),
        }
    }
}

impl Comparator {
    pub fn from_policy_path(policy_path: impl AsRef<Path>) -> Result<Self, ComparatorError> {
        let policy_path = policy_path.as_ref();
        let content =
            fs::read_to_string(policy_path).map_err(|source| ComparatorError::ReadPolicy {
                path: policy_path.to_path_buf(),
                source,
            })?;
        let raw: RawPolicy =
            serde_json::from_str(&content).map_err(|source| ComparatorError::ParsePolicy {
                path: policy_path.to_path_buf(),
                source,
            })?;
        Self::from_raw_policy(raw)
    }

    pub fn from_policy_json(policy_json: &str) -> Result<Self, ComparatorError> {
        let raw: RawPolicy =
            serde_json::from_str(policy_json).map_err(|source| ComparatorError::ParsePolicy {
                path: PathBuf::from("<inline-policy>"),
                source,
            })?;
        Self::from_raw_policy(raw)
    }

    /// A comparator that uses one strategy for every artifact.
    pub fn single_mode(mode: ComparisonMode, csv: CsvComparisonConfig) -> Self {
        Self {
            default_mode: mode,
            default_csv: csv,
            categories: Vec::new(),
        }
    }

    pub fn resolve_rule_for_artifact(&self, artifact_path: impl AsRef<Path>) -> ResolvedRule {
        let artifact_path = normalize_artifact_path(artifact_path.as_ref());
        self.categories
            .iter()
            .find(|category| category.matches(&artifact_path))
            .map(|category| ResolvedRule {
                mode: category.mode,
                category_id: Some(category.id.clone()),
                csv: category.csv.clone(),
            })
            .unwrap_or_else(|| ResolvedRule {
                mode: self.default_mode,
                category_id: None,
                csv: self.default_csv.clone(),
            })
    }

    /// Compares `actual_path` (the produced output) against `baseline_path`.
    pub fn compare_artifact(
        &self,
        artifact_path: impl AsRef<Path>,
        baseline_path: impl AsRef<Path>,
        actual_path: impl AsRef<Path>,
    ) -> Result<ArtifactComparisonResult, ComparatorError> {
        let artifact_path = normalize_artifact_path(artifact_path.as_ref());
        let rule = self.resolve_rule_for_artifact(&artifact_path);
        debug!(
            artifact = %artifact_path,
            mode = ?rule.mode,
            category = ?rule.category_id,
            "comparing artifact"
        );

        let (passed, reason, metrics) = match rule.mode {
            ComparisonMode::LineSet => {
                let report = compare_outputs(actual_path, baseline_path)?;
                (
                    report.passed,
                    report.failure_reason(),
                    ArtifactComparisonMetrics::LineSet(report),
                )
            }
            ComparisonMode::PositionalCsv => {
                let report = compare_output_csvs(actual_path, baseline_path, &rule.csv)?;
                (
                    report.passed,
                    report.failure_reason(),
                    ArtifactComparisonMetrics::PositionalCsv(PositionalCsvMetrics {
                        config: rule.csv.clone(),
                        report,
                    }),
                )
            }
        };

        Ok(ArtifactComparisonResult {
            artifact_path,
            mode: rule.mode,
            matched_category: rule.category_id,
            passed,
            reason,
            metrics,
        })
    }

    pub fn compare_artifacts(
        &self,
        artifacts: &[ArtifactPair],
    ) -> Result<Vec<ArtifactComparisonResult>, ComparatorError> {
        artifacts
            .iter()
            .map(|artifact| {
                self.compare_artifact(
                    &artifact.artifact_path,
                    &artifact.baseline_path,
                    &artifact.actual_path,
                )
            })
            .collect()
    }

    fn from_raw_policy(raw: RawPolicy) -> Result<Self, ComparatorError> {
        let default_csv = raw.default_csv.unwrap_or_default();
        default_csv
            .validate()
            .map_err(|error| ComparatorError::InvalidPolicy(format!("defaultCsv: {}", error.message())))?;

        let mut categories = Vec::with_capacity(raw.categories.len());
        for category in raw.categories {
            if category.file_globs.is_empty() {
                return Err(ComparatorError::InvalidPolicy(format!(
                    "category '{}' does not define any fileGlobs",
                    category.id
                )));
            }

            let matchers = category
                .file_globs
                .iter()
                .map(|pattern| {
                    Glob::new(pattern)
                        .map(|glob| glob.compile_matcher())
                        .map_err(|source| ComparatorError::InvalidGlob {
                            pattern: pattern.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let csv = category.csv.unwrap_or_else(|| default_csv.clone());
            csv.validate().map_err(|error| {
                ComparatorError::InvalidPolicy(format!(
                    "category '{}': {}",
                    category.id,
                    error.message()
                ))
            })?;

            categories.push(CompiledCategory {
                id: category.id,
                mode: category.mode,
                csv,
                matchers,
            });
        }

        Ok(Self {
            default_mode: raw.default_mode,
            default_csv,
            categories,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComparatorError {
    #[error("failed to read policy '{}': {source}", path.display())]
    ReadPolicy {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse policy '{}': {source}", path.display())]
    ParsePolicy {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
    #[error("failed to read artifact '{}': {source}", path.display())]
    ReadArtifact {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact '{}' is not valid UTF-8: {source}", path.display())]
    DecodeArtifact {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
}

impl From<ComparatorError> for GoldiffError {
    fn from(error: ComparatorError) -> Self {
        let message = error.to_string();
        match error {
            ComparatorError::ReadPolicy { .. } | ComparatorError::ReadArtifact { .. } => {
                GoldiffError::io_system("IO.COMPARATOR_ACCESS", message)
            }
            ComparatorError::ParsePolicy { .. }
            | ComparatorError::InvalidPolicy(_)
            | ComparatorError::InvalidGlob { .. } => {
                GoldiffError::input_validation("INPUT.COMPARATOR_POLICY", message)
            }
            ComparatorError::DecodeArtifact { .. } => {
                GoldiffError::input_validation("INPUT.COMPARATOR_ARTIFACT", message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicy {
    default_mode: ComparisonMode,
    #[serde(default)]
    default_csv: Option<CsvComparisonConfig>,
    #[serde(default)]
    categories: Vec<RawPolicyCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPolicyCategory {
    id: String,
    mode: ComparisonMode,
    #[serde(default)]
    file_globs: Vec<String>,
    #[serde(default)]
    csv: Option<CsvComparisonConfig>,
}

/// Reads a whole text file as newline-stripped lines.
///
/// `\n`, `\r\n` and a lone `\r` each end a line, so files written with old
/// Mac line endings split the same way as Unix or Windows ones.
pub(crate) fn read_artifact_lines(path: &Path) -> Result<Vec<String>, ComparatorError> {
    let bytes = fs::read(path).map_err(|source| ComparatorError::ReadArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ComparatorError::DecodeArtifact {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(split_universal_lines(&text))
}

fn split_universal_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::to_string)
        .collect()
}

fn normalize_artifact_path(path: &Path) -> String {
    let mut normalized = path.to_string_lossy().replace('\\', "/");
    while let Some(stripped) = normalized.strip_prefix("./") {
        normalized = stripped.to_string();
    }
    normalized
}
