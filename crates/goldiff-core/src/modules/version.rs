/// Character index of the first difference between `left` and `right`.
///
/// When one string is a prefix of the other the shorter length is returned;
/// identical strings give `None`.
pub fn first_diff_index(left: &str, right: &str) -> Option<usize> {
    let mut left_chars = left.chars();
    let mut right_chars = right.chars();
    let mut index = 0;
    loop {
        match (left_chars.next(), right_chars.next()) {
            (None, None) => return None,
            (Some(left_char), Some(right_char)) if left_char == right_char => index += 1,
            _ => return Some(index),
        }
    }
}

/// True when two header lines differ only after an embedded version tag.
///
/// The marker must sit at the same character offset in both lines and the
/// first difference must fall strictly after the end of the marker.
pub fn is_version_diff(output_line: &str, expected_line: &str, marker: &str) -> bool {
    let Some(diff_index) = first_diff_index(output_line, expected_line) else {
        return false;
    };
    let (Some(output_marker), Some(expected_marker)) = (
        marker_char_offset(output_line, marker),
        marker_char_offset(expected_line, marker),
    ) else {
        return false;
    };

    output_marker == expected_marker && diff_index > output_marker + marker.chars().count()
}

fn marker_char_offset(line: &str, marker: &str) -> Option<usize> {
    line.find(marker)
        .map(|byte_offset| line[..byte_offset].chars().count())
}

#[cfg(test)]
mod tests {
    use super::{first_diff_index, is_version_diff};
    use crate::domain::DEFAULT_VERSION_MARKER;

    #[test]
    fn first_diff_index_scans_to_shorter_length() {
        assert_eq!(first_diff_index("aa", "ba"), Some(0));
        assert_eq!(first_diff_index("aa", "ab"), Some(1));
        assert_eq!(first_diff_index("aaa", "aab"), Some(2));
        assert_eq!(first_diff_index("aaa", "aaab"), Some(3));
        assert_eq!(first_diff_index("aaaba", "aaab"), Some(4));
        assert_eq!(
            first_diff_index("this is a string", "this isn't the same"),
            Some(7)
        );
    }

    #[test]
    fn first_diff_index_is_none_for_identical_strings() {
        assert_eq!(first_diff_index("same string", "same string"), None);
        assert_eq!(first_diff_index("", ""), None);
    }

    #[test]
    fn first_diff_index_of_extension_is_prefix_length() {
        for base in ["", "a", "Ti_K, Cr_K"] {
            let extended = format!("{base}, Fe_K");
            assert_eq!(
                first_diff_index(base, &extended),
                Some(base.chars().count())
            );
        }
    }

    #[test]
    fn first_diff_index_counts_characters_not_bytes() {
        assert_eq!(first_diff_index("µm 1", "µm 2"), Some(3));
    }

    #[test]
    fn version_only_differences_are_detected() {
        assert!(is_version_diff(
            "Something   PIQUANT 2.6.310-compiling  path/",
            "Something   PIQUANT 2.6.311-compiling  path/",
            DEFAULT_VERSION_MARKER
        ));
        assert!(is_version_diff(
            "Something   PIQUANT 2.6.310-compiling  path/",
            "Something   PIQUANT 2.6.0  path/",
            DEFAULT_VERSION_MARKER
        ));
    }

    #[test]
    fn differences_before_or_without_marker_are_real() {
        assert!(!is_version_diff(
            "Something   PIQUANT 2.6.310-compiling  path/",
            "Something else   PIQUANT 2.6.0  path/",
            DEFAULT_VERSION_MARKER
        ));
        assert!(!is_version_diff(
            "Something   PIQUANT 2.6.310-compiling  path/",
            "Totally, different, line",
            DEFAULT_VERSION_MARKER
        ));
        assert!(!is_version_diff(
            "Something PIQUANT 1.0",
            "Something PIQUANX 1.0",
            DEFAULT_VERSION_MARKER
        ));
    }

    #[test]
    fn difference_right_after_marker_is_not_version_only() {
        // Divergence at the first version character equals marker end, not past it.
        assert!(!is_version_diff("x PIQUANT 1", "x PIQUANT 2", DEFAULT_VERSION_MARKER));
        assert!(is_version_diff("x PIQUANT 1.1", "x PIQUANT 1.2", DEFAULT_VERSION_MARKER));
    }

    #[test]
    fn identical_lines_are_not_version_diffs() {
        assert!(!is_version_diff(
            "PIQUANT 1.2.1",
            "PIQUANT 1.2.1",
            DEFAULT_VERSION_MARKER
        ));
    }

    #[test]
    fn marker_is_configurable() {
        assert!(is_version_diff("tool v=1.2.0 out", "tool v=1.3.0 out", "v="));
        assert!(!is_version_diff("tool v=1.2.0 out", "tool v=1.3.0 out", "PIQUANT "));
    }
}
