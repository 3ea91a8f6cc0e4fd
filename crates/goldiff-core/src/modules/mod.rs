pub mod comparator;
pub mod csv_diff;
pub mod line_set;
pub mod regression;
pub mod row_diff;
pub mod version;

pub use comparator::{
    ArtifactComparisonMetrics, ArtifactComparisonResult, ArtifactPair, Comparator,
    ComparatorError, ComparisonMode, ResolvedRule,
};
pub use csv_diff::{
    CsvComparisonReport, CsvDifferences, MAX_REPORTED_DIFF_LINES, compare_csv_lines,
    compare_output_csvs, csv_differences,
};
pub use line_set::{LineSetReport, SortedLineMismatch, compare_line_sets, compare_outputs};
pub use regression::{
    RegressionRunReport, RegressionRunnerConfig, RegressionRunnerError, render_human_summary,
    run_regression,
};
pub use row_diff::{RowDifference, RowDifferenceKind, RowVerdict, compare_data_row};
pub use version::{first_diff_index, is_version_diff};
