//! Verdict types and aggregation

use serde::Serialize;

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The entry point did not finish in time
    TimeoutExceeded {
        elapsed_ms: u64,
        limit_ms: u64,
        /// The absolute ceiling, not the case's own timeout, was the limit
        ceiling_hit: bool,
    },
    /// The entry point returned an error or panicked
    ExecutionError { cause: String },
    /// Normalized output differs from the expected output
    AssertionMismatch { actual: String, expected: String },
}

impl FailureReason {
    /// Get short code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::TimeoutExceeded { .. } => "TLE",
            Self::ExecutionError { .. } => "RE",
            Self::AssertionMismatch { .. } => "WA",
        }
    }
}

/// Result of executing a single case
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// Display name of the case
    pub name: String,

    pub passed: bool,

    /// Captured output after normalization and trimming (what was compared)
    pub actual_normalized: String,

    /// Expected output after normalization and trimming
    pub expected_normalized: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,

    /// Wall-clock time spent waiting for the entry point
    pub elapsed_ms: u64,

    /// One human-readable line (or block) explaining the result
    pub diagnostic: String,

    /// Captured output, normalized but not trimmed, for display
    pub captured_output: String,

    /// Problem found while restoring the console streams, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_error: Option<String>,
}

impl Verdict {
    /// Get short code for verdict
    pub fn code(&self) -> &'static str {
        match &self.failure {
            None => "AC",
            Some(reason) => reason.code(),
        }
    }

    /// Check if verdict is a failure
    pub fn is_failure(&self) -> bool {
        !self.passed
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({} ms)", self.code(), self.name, self.elapsed_ms)
    }
}

/// Aggregated result for a whole suite
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,

    /// Results for each executed case, in order
    pub verdicts: Vec<Verdict>,

    /// Number of passed cases
    pub passed_count: usize,

    /// Number of cases the suite declares (some may be skipped by fail-fast)
    pub total_count: usize,

    /// Maximum elapsed time across executed cases (ms)
    pub max_elapsed_ms: u64,

    /// 1-based index of the first failing case, if any
    pub first_failure: Option<usize>,
}

impl SuiteReport {
    /// Create suite report from case verdicts
    pub fn from_verdicts(name: impl Into<String>, verdicts: Vec<Verdict>, total_count: usize) -> Self {
        let passed_count = verdicts.iter().filter(|v| v.passed).count();
        let max_elapsed_ms = verdicts.iter().map(|v| v.elapsed_ms).max().unwrap_or(0);
        let first_failure = verdicts.iter().position(Verdict::is_failure).map(|i| i + 1);

        Self {
            name: name.into(),
            verdicts,
            passed_count,
            total_count,
            max_elapsed_ms,
            first_failure,
        }
    }

    /// True when every declared case ran and passed
    pub fn all_passed(&self) -> bool {
        self.passed_count == self.total_count
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(name: &str, failure: Option<FailureReason>, elapsed_ms: u64) -> Verdict {
        Verdict {
            name: name.to_string(),
            passed: failure.is_none(),
            actual_normalized: String::new(),
            expected_normalized: String::new(),
            failure,
            elapsed_ms,
            diagnostic: String::new(),
            captured_output: String::new(),
            restore_error: None,
        }
    }

    #[test]
    fn test_codes() {
        assert_eq!(verdict("a", None, 0).code(), "AC");
        let tle = FailureReason::TimeoutExceeded {
            elapsed_ms: 1000,
            limit_ms: 1000,
            ceiling_hit: false,
        };
        assert_eq!(verdict("b", Some(tle), 1000).code(), "TLE");
        let re = FailureReason::ExecutionError { cause: "boom".into() };
        assert_eq!(verdict("c", Some(re), 3).to_string(), "[RE] c (3 ms)");
    }

    #[test]
    fn test_report_aggregation() {
        let verdicts = vec![
            verdict("1", None, 12),
            verdict(
                "2",
                Some(FailureReason::AssertionMismatch {
                    actual: "1".into(),
                    expected: "2".into(),
                }),
                40,
            ),
            verdict("3", None, 7),
        ];
        let report = SuiteReport::from_verdicts("fence", verdicts, 3);
        assert_eq!(report.passed_count, 2);
        assert_eq!(report.max_elapsed_ms, 40);
        assert_eq!(report.first_failure, Some(2));
        assert!(!report.all_passed());
    }

    #[test]
    fn test_report_json_shape() {
        let report = SuiteReport::from_verdicts(
            "echo",
            vec![verdict(
                "1",
                Some(FailureReason::TimeoutExceeded {
                    elapsed_ms: 101,
                    limit_ms: 100,
                    ceiling_hit: true,
                }),
                101,
            )],
            1,
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let failure = &json["verdicts"][0]["failure"];
        assert_eq!(failure["kind"], "TIMEOUT_EXCEEDED");
        assert_eq!(failure["ceiling_hit"], true);
        assert!(json["verdicts"][0].get("restore_error").is_none());
    }
}
