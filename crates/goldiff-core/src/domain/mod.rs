pub mod errors;

pub use errors::{GoldiffError, GoldiffErrorCategory, GoldiffResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Tag that precedes the tool version in the first line of produced files.
pub const DEFAULT_VERSION_MARKER: &str = "PIQUANT ";

/// How the first line of two files is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    #[default]
    Compare,
    IgnoreVersionOnly,
    IgnoreAll,
}

impl HeaderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compare => "compare",
            Self::IgnoreVersionOnly => "ignore_version_only",
            Self::IgnoreAll => "ignore_all",
        }
    }
}

impl Display for HeaderMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Settings for one positional comparison. Nothing here outlives the call it
/// is passed to.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CsvComparisonConfig {
    #[serde(default = "default_first_data_row")]
    pub first_data_row: usize,
    #[serde(default)]
    pub header_mode: HeaderMode,
    #[serde(default)]
    pub max_variance: f64,
    #[serde(default)]
    pub ignore_rows: BTreeSet<usize>,
    #[serde(default = "default_version_marker")]
    pub version_marker: String,
}

impl Default for CsvComparisonConfig {
    fn default() -> Self {
        Self {
            first_data_row: default_first_data_row(),
            header_mode: HeaderMode::default(),
            max_variance: 0.0,
            ignore_rows: BTreeSet::new(),
            version_marker: default_version_marker(),
        }
    }
}

impl CsvComparisonConfig {
    pub fn new(first_data_row: usize, header_mode: HeaderMode, max_variance: f64) -> Self {
        Self {
            first_data_row,
            header_mode,
            max_variance,
            ..Self::default()
        }
    }

    pub fn with_ignore_rows(mut self, rows: impl IntoIterator<Item = usize>) -> Self {
        self.ignore_rows.extend(rows);
        self
    }

    pub fn with_version_marker(mut self, marker: impl Into<String>) -> Self {
        self.version_marker = marker.into();
        self
    }

    pub fn validate(&self) -> GoldiffResult<()> {
        if !self.max_variance.is_finite() || self.max_variance < 0.0 {
            return Err(GoldiffError::input_validation(
                "INPUT.CSV_MAX_VARIANCE",
                format!(
                    "maxVariance must be a finite non-negative number, got {}",
                    self.max_variance
                ),
            ));
        }
        if self.header_mode == HeaderMode::IgnoreVersionOnly && self.version_marker.is_empty() {
            return Err(GoldiffError::input_validation(
                "INPUT.CSV_VERSION_MARKER",
                "versionMarker must not be empty when headerMode is ignore_version_only",
            ));
        }
        Ok(())
    }
}

fn default_first_data_row() -> usize {
    1
}

fn default_version_marker() -> String {
    DEFAULT_VERSION_MARKER.to_string()
}
