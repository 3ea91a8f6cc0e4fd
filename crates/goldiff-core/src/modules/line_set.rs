use super::comparator::{ComparatorError, read_artifact_lines};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// First position at which the two sorted sequences disagree. A missing side
/// means that sequence ran out of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortedLineMismatch {
    pub position: usize,
    pub output_line: Option<String>,
    pub expected_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSetReport {
    pub passed: bool,
    pub output_line_count: usize,
    pub expected_line_count: usize,
    pub first_mismatch: Option<SortedLineMismatch>,
}

impl LineSetReport {
    pub fn line_count_mismatch(&self) -> bool {
        self.output_line_count != self.expected_line_count
    }

    pub fn failure_reason(&self) -> Option<String> {
        if self.passed {
            return None;
        }

        let mismatch = self.first_mismatch.as_ref().map(|mismatch| {
            format!(
                "first sorted mismatch at position {}: output={}, expected={}",
                mismatch.position,
                describe_line(mismatch.output_line.as_deref()),
                describe_line(mismatch.expected_line.as_deref())
            )
        });

        let reason = match (self.line_count_mismatch(), mismatch) {
            (true, Some(mismatch)) => format!(
                "Line count mismatch (output={}, expected={}); {mismatch}.",
                self.output_line_count, self.expected_line_count
            ),
            (true, None) => format!(
                "Line count mismatch (output={}, expected={}).",
                self.output_line_count, self.expected_line_count
            ),
            (false, Some(mismatch)) => format!("Sorted lines differ; {mismatch}."),
            (false, None) => "Sorted lines differ.".to_string(),
        };
        Some(reason)
    }
}

fn describe_line(line: Option<&str>) -> String {
    match line {
        Some(line) => format!("{line:?}"),
        None => "<missing>".to_string(),
    }
}

/// Order-insensitive exact comparison of two line sequences.
///
/// Both sides are sorted lexicographically; the comparison passes only when
/// the sorted sequences are identical.
pub fn compare_line_sets<O, E>(output_lines: &[O], expected_lines: &[E]) -> LineSetReport
where
    O: AsRef<str>,
    E: AsRef<str>,
{
    let mut output_sorted: Vec<&str> = output_lines.iter().map(|line| line.as_ref()).collect();
    let mut expected_sorted: Vec<&str> = expected_lines.iter().map(|line| line.as_ref()).collect();
    output_sorted.sort_unstable();
    expected_sorted.sort_unstable();

    let first_mismatch = first_sorted_mismatch(&output_sorted, &expected_sorted);

    LineSetReport {
        passed: first_mismatch.is_none(),
        output_line_count: output_sorted.len(),
        expected_line_count: expected_sorted.len(),
        first_mismatch,
    }
}

fn first_sorted_mismatch(output_sorted: &[&str], expected_sorted: &[&str]) -> Option<SortedLineMismatch> {
    if let Some((position, (output_line, expected_line))) = output_sorted
        .iter()
        .zip(expected_sorted.iter())
        .enumerate()
        .find(|(_, (output_line, expected_line))| output_line != expected_line)
    {
        return Some(SortedLineMismatch {
            position,
            output_line: Some((*output_line).to_string()),
            expected_line: Some((*expected_line).to_string()),
        });
    }

    if output_sorted.len() == expected_sorted.len() {
        return None;
    }

    let position = output_sorted.len().min(expected_sorted.len());
    Some(SortedLineMismatch {
        position,
        output_line: output_sorted.get(position).map(|line| (*line).to_string()),
        expected_line: expected_sorted.get(position).map(|line| (*line).to_string()),
    })
}

/// Reads two files and compares them with [`compare_line_sets`].
pub fn compare_outputs(
    output_path: impl AsRef<Path>,
    expected_path: impl AsRef<Path>,
) -> Result<LineSetReport, ComparatorError> {
    let output_path = output_path.as_ref();
    let expected_path = expected_path.as_ref();
    let output_lines = read_artifact_lines(output_path)?;
    let expected_lines = read_artifact_lines(expected_path)?;

    let report = compare_line_sets(&output_lines, &expected_lines);
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
            "line-set comparison finished"
        );
    }
    Ok(report)
}
