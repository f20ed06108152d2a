//! Suites: a solution, a timeout, and the cases that exercise them
//!
//! A suite is what a test author writes. It stands in for declarative
//! per-class configuration: the builder collects a solution, a per-case
//! timeout and any number of (input, expected output) pairs, and `build`
//! refuses anything that could not run.
//!
//! ```no_run
//! # async fn demo() -> psjudge::HarnessResult<()> {
//! use psjudge::{samples, CaseExecutor, HarnessConfig, Suite};
//!
//! let suite = Suite::builder("fence")
//!     .timeout_seconds(1.0)
//!     .solution(samples::fence)
//!     .case("3\n7\n7 1 5 9 6 7 3", "20")
//!     .build()?;
//!
//! let report = suite.run(&CaseExecutor::new(&HarnessConfig::default())).await;
//! assert!(report.all_passed());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::case::{display_name, timeout_from_seconds, Case};
use crate::config::HarnessConfig;
use crate::constants::DEFAULT_TIMEOUT_SECONDS;
use crate::deadline::EntryPoint;
use crate::error::{HarnessError, HarnessResult};
use crate::executor::CaseExecutor;
use crate::redirect::StreamRedirector;
use crate::verdict::SuiteReport;

/// Declared input and expected output of one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSpec {
    pub input: String,
    pub output: String,
}

impl<I, O> From<(I, O)> for CaseSpec
where
    I: Into<String>,
    O: Into<String>,
{
    fn from((input, output): (I, O)) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// A validated group of cases sharing one solution and one timeout
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    timeout: Duration,
    solution: EntryPoint,
    specs: Vec<CaseSpec>,
    fail_fast: bool,
}

impl Suite {
    pub fn builder(name: impl Into<String>) -> SuiteBuilder {
        SuiteBuilder {
            name: name.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            solution: None,
            specs: Vec::new(),
            fail_fast: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// One resolved case per declared spec, named `[index] input: preview`
    pub fn cases(&self) -> Vec<Case> {
        self.specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                Case::from_parts(
                    display_name(i + 1, &spec.input),
                    spec.input.as_str(),
                    spec.output.as_str(),
                    self.timeout,
                    self.solution.clone(),
                )
            })
            .collect()
    }

    /// Run every case in order.
    ///
    /// The console gate is held for the whole suite, so no other case can run
    /// between two of this suite's cases.
    pub async fn run(&self, executor: &CaseExecutor) -> SuiteReport {
        tracing::info!(suite = %self.name, cases = self.len(), "Running suite");

        let mut gate = StreamRedirector::lock().await;
        let mut verdicts = Vec::with_capacity(self.len());

        for case in self.cases() {
            let (verdict, returned) = executor.execute_locked(gate, case).await;
            gate = returned;
            let failed = verdict.is_failure();
            verdicts.push(verdict);

            if failed && self.fail_fast {
                tracing::info!(suite = %self.name, "Stopping suite after first failure");
                break;
            }
        }
        drop(gate);

        let report = SuiteReport::from_verdicts(self.name.clone(), verdicts, self.len());
        tracing::info!(
            suite = %report.name,
            passed = report.passed_count,
            total = report.total_count,
            max_elapsed_ms = report.max_elapsed_ms,
            "Suite finished"
        );
        report
    }
}

/// Collects suite configuration; see [`Suite::builder`]
#[derive(Debug, Clone)]
pub struct SuiteBuilder {
    name: String,
    timeout_seconds: f64,
    solution: Option<EntryPoint>,
    specs: Vec<CaseSpec>,
    fail_fast: bool,
}

impl SuiteBuilder {
    /// Take the default timeout and fail-fast setting from configuration
    pub fn with_config(mut self, config: &HarnessConfig) -> Self {
        self.timeout_seconds = config.default_timeout_seconds;
        self.fail_fast = config.fail_fast;
        self
    }

    /// Per-case timeout in seconds (default 1.0)
    pub fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// The solution's entry point, named after the suite
    pub fn solution<F>(mut self, func: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.solution = Some(EntryPoint::new(self.name.clone(), func));
        self
    }

    pub fn entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.solution = Some(entry_point);
        self
    }

    pub fn case(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.specs.push(CaseSpec {
            input: input.into(),
            output: output.into(),
        });
        self
    }

    pub fn cases<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CaseSpec>,
    {
        self.specs.extend(specs.into_iter().map(Into::into));
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn build(self) -> HarnessResult<Suite> {
        let Some(solution) = self.solution else {
            return Err(HarnessError::MisconfiguredCase(format!(
                "suite `{}` declares {} case(s) but no solution",
                self.name,
                self.specs.len()
            )));
        };

        if self.specs.is_empty() {
            return Err(HarnessError::MisconfiguredCase(format!(
                "suite `{}` declares no cases",
                self.name
            )));
        }

        let timeout = timeout_from_seconds(self.timeout_seconds)?;

        Ok(Suite {
            name: self.name,
            timeout,
            solution,
            specs: self.specs,
            fail_fast: self.fail_fast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineRunner;
    use crate::samples;
    use tokio_test::{assert_err, assert_ok};

    fn executor() -> CaseExecutor {
        CaseExecutor::with_runner(DeadlineRunner::default())
    }

    #[test]
    fn test_build_rejects_misconfiguration() {
        let err = assert_err!(Suite::builder("orphan").case("1", "1").build());
        assert_eq!(err.error_code(), "MISCONFIGURED_CASE");
        assert!(err.to_string().contains("no solution"));

        let err = assert_err!(Suite::builder("empty").solution(samples::echo).build());
        assert!(err.to_string().contains("no cases"));

        assert_err!(
            Suite::builder("instant")
                .solution(samples::echo)
                .timeout_seconds(0.0)
                .case("1", "1")
                .build()
        );
    }

    #[test]
    fn test_cases_are_named_and_share_settings() {
        let suite = assert_ok!(
            Suite::builder("sum")
                .timeout_seconds(0.5)
                .solution(samples::sum)
                .case("1 2", "3")
                .cases([("4\n5", "9"), ("", "0")])
                .build()
        );
        assert_eq!(suite.len(), 3);

        let cases = suite.cases();
        assert_eq!(cases[0].name(), "[1] input: 1 2");
        assert_eq!(cases[1].name(), "[2] input: 4\\n5");
        assert!(cases.iter().all(|c| c.timeout() == Duration::from_millis(500)));
        assert!(cases.iter().all(|c| c.entry_point().name() == "sum"));
    }

    #[test]
    fn test_with_config_defaults() {
        let config = HarnessConfig {
            default_timeout_seconds: 2.5,
            fail_fast: true,
            ..HarnessConfig::default()
        };
        let suite = assert_ok!(
            Suite::builder("echo")
                .with_config(&config)
                .solution(samples::echo)
                .case("a", "a")
                .build()
        );
        assert_eq!(suite.timeout(), Duration::from_millis(2500));
        assert!(suite.fail_fast);
    }

    #[tokio::test]
    async fn test_fence_suite_runs_all_cases() {
        let suite = assert_ok!(
            Suite::builder("fence")
                .timeout_seconds(1.0)
                .solution(samples::fence)
                .cases([
                    ("3\n7\n7 1 5 9 6 7 3", "20"),
                    ("1\n7\n1 4 4 4 4 1 1", "16"),
                    ("3\n7\n7 1 5 9 6 7 3\n7\n1 4 4 4 4 1 1\n4\n1 8 2 2\n", "20\n16\n8"),
                    ("1\n4\n1 8 2 2", "9"),
                ])
                .build()
        );

        let report = suite.run(&executor()).await;
        assert_eq!(report.total_count, 4);
        assert_eq!(report.verdicts.len(), 4);
        assert_eq!(report.passed_count, 3);
        assert_eq!(report.first_failure, Some(4));
        assert_eq!(report.verdicts[3].code(), "WA");
    }

    #[tokio::test]
    async fn test_fail_fast_stops_after_first_failure() {
        let suite = assert_ok!(
            Suite::builder("sum")
                .solution(samples::sum)
                .fail_fast(true)
                .cases([("1 1", "3"), ("2 2", "4")])
                .build()
        );

        let report = suite.run(&executor()).await;
        assert_eq!(report.verdicts.len(), 1);
        assert_eq!(report.total_count, 2);
        assert!(!report.all_passed());
    }
}
