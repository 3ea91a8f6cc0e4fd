use super::comparator::{ComparatorError, read_artifact_lines};
use super::row_diff::{RowDifference, compare_data_row};
use super::version::is_version_diff;
use crate::domain::{CsvComparisonConfig, HeaderMode};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Number of differing lines carried in a report for display.
pub const MAX_REPORTED_DIFF_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRegion {
    Header,
    Preamble,
    Data,
    IgnoredRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDifference {
    pub index: usize,
    pub region: LineRegion,
    pub skipped: bool,
    pub variance: Option<f64>,
    pub row_difference: Option<RowDifference>,
}

/// Classification of every line index whose raw text differs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CsvDifferences {
    pub skipped: Vec<usize>,
    pub different: Vec<usize>,
    pub max_variance: f64,
    pub lines: Vec<LineDifference>,
}

impl CsvDifferences {
    pub fn is_clean(&self) -> bool {
        self.different.is_empty()
    }

    fn record(&mut self, line: LineDifference) {
        if line.skipped {
            self.skipped.push(line.index);
        } else {
            self.different.push(line.index);
        }
        self.lines.push(line);
    }
}

/// Walks both line sequences position by position, up to the shorter length.
///
/// Identical lines are not reported. Differing lines are sorted into skipped
/// and different according to where they sit (header, preamble, data) and the
/// settings in `config`. `max_variance` tracks the largest relative variance
/// produced by any data row that was actually compared.
pub fn csv_differences<O, E>(
    output_lines: &[O],
    expected_lines: &[E],
    config: &CsvComparisonConfig,
) -> CsvDifferences
where
    O: AsRef<str>,
    E: AsRef<str>,
{
    let mut differences = CsvDifferences::default();

    for (index, (output_line, expected_line)) in
        output_lines.iter().zip(expected_lines.iter()).enumerate()
    {
        let output_line = output_line.as_ref();
        let expected_line = expected_line.as_ref();
        if output_line == expected_line {
            continue;
        }

        let line = if index == 0 {
            classify_header(output_line, expected_line, config)
        } else if index < config.first_data_row {
            LineDifference {
                index,
                region: LineRegion::Preamble,
                skipped: false,
                variance: None,
                row_difference: None,
            }
        } else if config.ignore_rows.contains(&index) {
            LineDifference {
                index,
                region: LineRegion::IgnoredRow,
                skipped: true,
                variance: None,
                row_difference: None,
            }
        } else {
            let verdict = compare_data_row(output_line, expected_line, config.max_variance);
            let variance = verdict.variance();
            if let Some(variance) = variance {
                differences.max_variance = differences.max_variance.max(variance);
            }
            LineDifference {
                index,
                region: LineRegion::Data,
                skipped: verdict.is_acceptable(),
                variance,
                row_difference: verdict.difference().cloned(),
            }
        };

        differences.record(line);
    }

    differences
}

fn classify_header(
    output_line: &str,
    expected_line: &str,
    config: &CsvComparisonConfig,
) -> LineDifference {
    let skipped = match config.header_mode {
        HeaderMode::Compare => false,
        HeaderMode::IgnoreAll => true,
        HeaderMode::IgnoreVersionOnly => {
            is_version_diff(output_line, expected_line, &config.version_marker)
        }
    };

    LineDifference {
        index: 0,
        region: LineRegion::Header,
        skipped,
        variance: None,
        row_difference: None,
    }
}

/// Exact text of one differing line pair, kept for failure output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffExcerpt {
    pub index: usize,
    pub output_line: String,
    pub expected_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvComparisonReport {
    pub passed: bool,
    pub output_line_count: usize,
    pub expected_line_count: usize,
    /// `None` when the line counts differ; no classification is attempted then.
    pub differences: Option<CsvDifferences>,
    pub excerpts: Vec<DiffExcerpt>,
}

impl CsvComparisonReport {
    pub fn line_count_mismatch(&self) -> bool {
        self.output_line_count != self.expected_line_count
    }

    pub fn max_variance(&self) -> f64 {
        self.differences
            .as_ref()
            .map_or(0.0, |differences| differences.max_variance)
    }

    pub fn failure_reason(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        if self.line_count_mismatch() {
            return Some(format!(
                "Line count mismatch (output={}, expected={}).",
                self.output_line_count, self.expected_line_count
            ));
        }

        let differences = self.differences.as_ref()?;
        let first = differences.different.first()?;
        Some(format!(
            "{} differing line(s), first at line index {} (max variance {:.10}).",
            differences.different.len(),
            first,
            differences.max_variance
        ))
    }
}

/// Positional comparison of two files on disk.
///
/// A line count mismatch fails the comparison outright.
pub fn compare_output_csvs(
    output_path: impl AsRef<Path>,
    expected_path: impl AsRef<Path>,
    config: &CsvComparisonConfig,
) -> Result<CsvComparisonReport, ComparatorError> {
    let output_path = output_path.as_ref();
    let expected_path = expected_path.as_ref();
    let output_lines = read_artifact_lines(output_path)?;
    let expected_lines = read_artifact_lines(expected_path)?;

    let report = compare_csv_lines(&output_lines, &expected_lines, config);
    if report.line_count_mismatch() {
        warn!(
            output = %output_path.display(),
            expected = %expected_path.display(),
            output_lines = report.output_line_count,
            expected_lines = report.expected_line_count,
            "line count mismatch"
        );
    } else {
        debug!(
            output = %output_path.display(),
            expected = %expected_path.display(),
            passed = report.passed,
            max_variance = report.max_variance(),
            "positional comparison finished"
        );
    }
    Ok(report)
}

/// In-memory form of [`compare_output_csvs`].
pub fn compare_csv_lines<O, E>(
    output_lines: &[O],
    expected_lines: &[E],
    config: &CsvComparisonConfig,
) -> CsvComparisonReport
where
    O: AsRef<str>,
    E: AsRef<str>,
{
    let output_line_count = output_lines.len();
    let expected_line_count = expected_lines.len();

    if output_line_count != expected_line_count {
        return CsvComparisonReport {
            passed: false,
            output_line_count,
            expected_line_count,
            differences: None,
            excerpts: Vec::new(),
        };
    }

    let differences = csv_differences(output_lines, expected_lines, config);
    let excerpts = differences
        .different
        .iter()
        .take(MAX_REPORTED_DIFF_LINES)
        .map(|&index| DiffExcerpt {
            index,
            output_line: output_lines[index].as_ref().to_string(),
            expected_line: expected_lines[index].as_ref().to_string(),
        })
        .collect();

    CsvComparisonReport {
        passed: differences.is_clean(),
        output_line_count,
        expected_line_count,
        differences: Some(differences),
        excerpts,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LineRegion, MAX_REPORTED_DIFF_LINES, compare_csv_lines, compare_output_csvs,
        csv_differences,
    };
    use crate::domain::{CsvComparisonConfig, HeaderMode};
    use crate::modules::row_diff::RowDifferenceKind;
    use std::fs;
    use tempfile::TempDir;

    const OUTPUT: [&str; 3] = ["some PIQUANT 1.2.1 file", "A, B, C", "100, 200, 300"];
    const EXPECTED: [&str; 3] = ["some PIQUANT 1.2.4 file", "A, B, E", "105, 200, 280"];

    fn classify(config: &CsvComparisonConfig) -> (Vec<usize>, Vec<usize>, f64) {
        let differences = csv_differences(&OUTPUT, &EXPECTED, config);
        (
            differences.skipped,
            differences.different,
            differences.max_variance,
        )
    }

    #[test]
    fn compare_mode_flags_every_differing_line() {
        let config = CsvComparisonConfig::new(2, HeaderMode::Compare, 0.0);
        assert_eq!(
            classify(&config),
            (vec![], vec![0, 1, 2], 0.047619047619047616)
        );
    }

    #[test]
    fn ignore_all_mode_skips_header() {
        let config = CsvComparisonConfig::new(2, HeaderMode::IgnoreAll, 0.0);
        assert_eq!(
            classify(&config),
            (vec![0], vec![1, 2], 0.047619047619047616)
        );
    }

    #[test]
    fn version_mode_skips_version_header_and_reports_violating_row() {
        let config = CsvComparisonConfig::new(2, HeaderMode::IgnoreVersionOnly, 0.048);
        assert_eq!(
            classify(&config),
            (vec![0], vec![1, 2], 0.07142857142857142)
        );
    }

    #[test]
    fn looser_threshold_tolerates_data_row_but_keeps_its_variance() {
        let config = CsvComparisonConfig::new(2, HeaderMode::IgnoreVersionOnly, 0.072);
        assert_eq!(
            classify(&config),
            (vec![0, 2], vec![1], 0.07142857142857142)
        );
    }

    #[test]
    fn ignored_rows_are_skipped_without_variance() {
        let config =
            CsvComparisonConfig::new(2, HeaderMode::IgnoreVersionOnly, 0.0).with_ignore_rows([2]);
        assert_eq!(classify(&config), (vec![0, 2], vec![1], 0.0));

        let differences = csv_differences(&OUTPUT, &EXPECTED, &config);
        assert_eq!(differences.lines[2].region, LineRegion::IgnoredRow);
    }

    #[test]
    fn real_header_difference_is_flagged_in_version_mode() {
        let output = ["made by PIQUANT 1.2.1", "1, 2"];
        let expected = ["built by PIQUANT 1.2.1", "1, 2"];
        let config = CsvComparisonConfig::new(1, HeaderMode::IgnoreVersionOnly, 0.0);
        let differences = csv_differences(&output, &expected, &config);
        assert_eq!(differences.different, vec![0]);
    }

    #[test]
    fn ignore_all_never_flags_header() {
        let output = ["anything", "1"];
        let expected = ["completely different header, with, commas", "1"];
        let config = CsvComparisonConfig::new(1, HeaderMode::IgnoreAll, 0.0);
        let differences = csv_differences(&output, &expected, &config);
        assert_eq!(differences.skipped, vec![0]);
        assert!(differences.is_clean());
    }

    #[test]
    fn preamble_lines_are_never_tolerance_checked() {
        let output = ["h", "1.0, 2.0", "3.0"];
        let expected = ["h", "1.0, 2.1", "3.0"];
        let config = CsvComparisonConfig::new(2, HeaderMode::Compare, 1.0).with_ignore_rows([1]);
        let differences = csv_differences(&output, &expected, &config);
        assert_eq!(differences.different, vec![1]);
        assert_eq!(differences.lines[0].region, LineRegion::Preamble);
    }

    #[test]
    fn classification_stops_at_shorter_input() {
        let output = ["h", "1", "2", "3"];
        let expected = ["h", "1", "9"];
        let config = CsvComparisonConfig::new(1, HeaderMode::Compare, 0.0);
        let differences = csv_differences(&output, &expected, &config);
        assert_eq!(differences.different, vec![2]);
    }

    #[test]
    fn data_row_details_are_kept() {
        let output = ["h", "1, a"];
        let expected = ["h", "1, b"];
        let config = CsvComparisonConfig::new(1, HeaderMode::Compare, 0.5);
        let differences = csv_differences(&output, &expected, &config);
        let detail = differences.lines[0]
            .row_difference
            .as_ref()
            .expect("row difference should be recorded");
        assert_eq!(detail.kind, RowDifferenceKind::TextMismatch);
        assert_eq!(detail.field_index, Some(1));
    }

    #[test]
    fn line_count_mismatch_fails_without_classification() {
        let report = compare_csv_lines(
            &["h", "1"],
            &["h", "1", "2"],
            &CsvComparisonConfig::default(),
        );
        assert!(!report.passed);
        assert!(report.line_count_mismatch());
        assert!(report.differences.is_none());
        assert!(
            report
                .failure_reason()
                .expect("failure should have reason")
                .contains("Line count mismatch")
        );
    }

    #[test]
    fn excerpts_are_capped() {
        let output: Vec<String> = (0..30).map(|index| format!("{index}, a")).collect();
        let expected: Vec<String> = (0..30).map(|index| format!("{index}, b")).collect();
        let config = CsvComparisonConfig::new(1, HeaderMode::Compare, 0.0);
        let report = compare_csv_lines(&output, &expected, &config);

        assert!(!report.passed);
        assert_eq!(report.excerpts.len(), MAX_REPORTED_DIFF_LINES);
        assert_eq!(report.excerpts[0].index, 0);
        assert_eq!(report.excerpts[0].output_line, "0, a");
        assert_eq!(report.excerpts[0].expected_line, "0, b");
    }

    #[test]
    fn compares_files_on_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let output_path = temp.path().join("output.csv");
        let expected_path = temp.path().join("expected.csv");
        fs::write(
            &output_path,
            "PIQUANT 3.2.1 map\r\nPMC, Fe_%\r\n1, 10.001\r\n2, nan\r\n",
        )
        .expect("output should be written");
        fs::write(
            &expected_path,
            "PIQUANT 3.2.0 map\nPMC, Fe_%\n1, 10.0\n2, -nan\n",
        )
        .expect("expected should be written");

        let config = CsvComparisonConfig::new(2, HeaderMode::IgnoreVersionOnly, 0.001);
        let report = compare_output_csvs(&output_path, &expected_path, &config)
            .expect("comparison should succeed");

        assert!(report.passed);
        assert_eq!(report.output_line_count, 4);
        let differences = report.differences.expect("differences should be present");
        assert_eq!(differences.skipped, vec![0, 2, 3]);
        assert!(differences.max_variance > 0.0);
    }
}
