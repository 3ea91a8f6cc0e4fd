use crate::numerics::{FieldValue, parse_field_value, relative_variance};
use serde::Serialize;
use tracing::debug;

pub const FIELD_DELIMITER: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDifferenceKind {
    FieldCountMismatch { output: usize, expected: usize },
    TextMismatch,
    NumericKindMismatch,
    UndefinedVariance,
    VarianceExceeded,
}

/// The field that disqualified a data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDifference {
    pub field_index: Option<usize>,
    pub kind: RowDifferenceKind,
    pub output_field: Option<String>,
    pub expected_field: Option<String>,
    pub variance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RowVerdict {
    /// Every field matched; `peak_variance` is the largest tolerated drift.
    Acceptable { peak_variance: Option<f64> },
    Different(RowDifference),
}

impl RowVerdict {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Acceptable { .. })
    }

    pub fn variance(&self) -> Option<f64> {
        match self {
            Self::Acceptable { peak_variance } => *peak_variance,
            Self::Different(difference) => difference.variance,
        }
    }

    pub fn difference(&self) -> Option<&RowDifference> {
        match self {
            Self::Acceptable { .. } => None,
            Self::Different(difference) => Some(difference),
        }
    }
}

enum FieldOutcome {
    Equal,
    Tolerated(f64),
    Violation {
        kind: RowDifferenceKind,
        variance: Option<f64>,
    },
}

pub fn split_row(line: &str) -> Vec<&str> {
    line.split(FIELD_DELIMITER).map(str::trim).collect()
}

/// Compares two comma-separated rows field by field.
///
/// Fields that both parse as finite numbers may drift by up to
/// `max_variance` relative to the expected value (inclusive). Scanning stops
/// at the first field that is not acceptable.
pub fn compare_data_row(output: &str, expected: &str, max_variance: f64) -> RowVerdict {
    let output_fields = split_row(output);
    let expected_fields = split_row(expected);

    if output_fields.len() != expected_fields.len() {
        debug!(
            output = output_fields.len(),
            expected = expected_fields.len(),
            "field count differs"
        );
        return RowVerdict::Different(RowDifference {
            field_index: None,
            kind: RowDifferenceKind::FieldCountMismatch {
                output: output_fields.len(),
                expected: expected_fields.len(),
            },
            output_field: None,
            expected_field: None,
            variance: None,
        });
    }

    let mut peak_variance: Option<f64> = None;
    for (field_index, (output_field, expected_field)) in
        output_fields.iter().zip(expected_fields.iter()).enumerate()
    {
        match compare_field(output_field, expected_field, max_variance) {
            FieldOutcome::Equal => {}
            FieldOutcome::Tolerated(variance) => {
                peak_variance = Some(peak_variance.map_or(variance, |peak| peak.max(variance)));
            }
            FieldOutcome::Violation { kind, variance } => {
                debug!(
                    field_index,
                    output = *output_field,
                    expected = *expected_field,
                    ?kind,
                    ?variance,
                    "data row field differs"
                );
                return RowVerdict::Different(RowDifference {
                    field_index: Some(field_index),
                    kind,
                    output_field: Some((*output_field).to_string()),
                    expected_field: Some((*expected_field).to_string()),
                    variance,
                });
            }
        }
    }

    RowVerdict::Acceptable { peak_variance }
}

fn compare_field(output: &str, expected: &str, max_variance: f64) -> FieldOutcome {
    let output_value = parse_field_value(output);
    let expected_value = parse_field_value(expected);

    match (output_value, expected_value) {
        (FieldValue::Text(output_text), FieldValue::Text(expected_text)) => {
            if output_text == expected_text {
                FieldOutcome::Equal
            } else {
                FieldOutcome::Violation {
                    kind: RowDifferenceKind::TextMismatch,
                    variance: None,
                }
            }
        }
        (FieldValue::Integer(output_number), FieldValue::Integer(expected_number)) => {
            compare_integers(output_number, expected_number, max_variance)
        }
        _ => match (output_value.finite(), expected_value.finite()) {
            (Some(output_number), Some(expected_number)) => {
                compare_finite(output_number, expected_number, max_variance)
            }
            // Non-finite on both sides (nan vs -nan, inf vs inf) is a match.
            (None, None) => FieldOutcome::Equal,
            (Some(_), None) | (None, Some(_)) => FieldOutcome::Violation {
                kind: RowDifferenceKind::NumericKindMismatch,
                variance: None,
            },
        },
    }
}

/// Exact equality on the integers themselves; only the variance goes through `f64`.
fn compare_integers(output: i64, expected: i64, max_variance: f64) -> FieldOutcome {
    if output == expected {
        return FieldOutcome::Equal;
    }
    if expected == 0 {
        return grade_variance(None, max_variance);
    }

    let difference = i128::from(output) - i128::from(expected);
    grade_variance(
        Some((difference as f64 / expected as f64).abs()),
        max_variance,
    )
}

fn compare_finite(output: f64, expected: f64, max_variance: f64) -> FieldOutcome {
    if output == expected {
        return FieldOutcome::Equal;
    }
    grade_variance(relative_variance(output, expected), max_variance)
}

fn grade_variance(variance: Option<f64>, max_variance: f64) -> FieldOutcome {
    match variance {
        None => FieldOutcome::Violation {
            kind: RowDifferenceKind::UndefinedVariance,
            variance: None,
        },
        Some(variance) if variance > max_variance => FieldOutcome::Violation {
            kind: RowDifferenceKind::VarianceExceeded,
            variance: Some(variance),
        },
        Some(variance) => FieldOutcome::Tolerated(variance),
    }
}
