//! Output normalization and comparison
//!
//! Trailing whitespace on a line is noise left behind by `print`-style output
//! and is ignored. Everything else is significant: leading whitespace, blank
//! lines between content, and line order.

use serde::Serialize;

/// Whitespace stripped from line ends: space, tab, CR, vertical tab, form feed
fn is_trailing_noise(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0B' | '\x0C')
}

/// Strip trailing whitespace from every line and rejoin with `\n`.
///
/// Trailing empty lines are dropped and no final newline is added, so
/// `normalize(normalize(t)) == normalize(t)`.
pub fn normalize(text: &str) -> String {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.trim_end_matches(is_trailing_noise))
        .collect();

    while lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Normalized texts and whether they are equal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub actual: String,
    pub expected: String,
    pub matched: bool,
}

/// Normalize both sides, trim the whole of each, and compare.
pub fn compare(actual: &str, expected: &str) -> Comparison {
    let actual = normalize(actual).trim().to_string();
    let expected = normalize(expected).trim().to_string();
    let matched = actual == expected;

    Comparison {
        actual,
        expected,
        matched,
    }
}

/// Human-readable description of a failed comparison
pub fn render_mismatch(comparison: &Comparison) -> String {
    let mut report = String::from("Output mismatch");

    let actual_lines: Vec<&str> = comparison.actual.lines().collect();
    let expected_lines: Vec<&str> = comparison.expected.lines().collect();
    let first_difference = (0..actual_lines.len().max(expected_lines.len()))
        .find(|&i| actual_lines.get(i) != expected_lines.get(i));

    if let Some(i) = first_difference {
        report.push_str(&format!(
            " at line {}: expected {:?}, got {:?}",
            i + 1,
            expected_lines.get(i).copied().unwrap_or("<end of output>"),
            actual_lines.get(i).copied().unwrap_or("<end of output>"),
        ));
    }

    report.push_str("\n--- expected\n");
    report.push_str(&comparison.expected);
    report.push_str("\n+++ actual\n");
    report.push_str(&comparison.actual);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_whitespace_is_ignored() {
        assert_eq!(normalize("a  \nb\t\n"), normalize("a\nb\n"));
        assert_eq!(normalize("a  \nb\t\n"), "a\nb");
        assert_eq!(normalize("x\r\ny\r\n"), "x\ny");
    }

    #[test]
    fn test_leading_whitespace_is_kept() {
        assert_ne!(normalize("  a\n"), normalize("a\n"));
        assert_eq!(normalize("  a\n"), "  a");
    }

    #[test]
    fn test_inner_blank_lines_are_kept() {
        assert_eq!(normalize("a\n\nb\n\n\n"), "a\n\nb");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n"), "");
    }

    #[test]
    fn test_compare_trims_whole_text() {
        let result = compare("16 ", "16");
        assert!(result.matched);
        assert_eq!(result.actual, "16");

        assert!(compare("\n20\n\n", "20").matched);
        assert!(!compare("1 2", "1  2").matched);
    }

    #[test]
    fn test_render_mismatch_points_at_first_difference() {
        let report = render_mismatch(&compare("1\n2\n4", "1\n2\n3"));
        assert!(report.starts_with("Output mismatch at line 3: expected \"3\", got \"4\""));
        assert!(report.contains("--- expected\n1\n2\n3"));
        assert!(report.contains("+++ actual\n1\n2\n4"));

        let report = render_mismatch(&compare("1", "1\n2"));
        assert!(report.contains("at line 2: expected \"2\", got \"<end of output>\""));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in "[a-c \t\r\n]{0,40}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn trailing_padding_never_changes_the_result(
            lines in proptest::collection::vec("[a-z ]{0,8}[a-z]", 1..6),
            pad in "[ \t]{0,4}",
        ) {
            let plain = lines.join("\n");
            let padded = lines
                .iter()
                .map(|line| format!("{line}{pad}"))
                .collect::<Vec<_>>()
                .join("\n");
            prop_assert_eq!(normalize(&padded), normalize(&plain));
        }
    }
}
