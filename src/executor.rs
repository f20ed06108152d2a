//! Case executor: redirect, run under a deadline, restore, compare

use std::sync::Arc;

use tracing::Instrument;

use crate::case::Case;
use crate::config::HarnessConfig;
use crate::deadline::{DeadlineRunner, RunOutcome};
use crate::normalize;
use crate::redirect::{Released, StreamGate, StreamRedirector};
use crate::reporter::{CaseReporter, StdoutReporter};
use crate::verdict::{FailureReason, Verdict};

/// Runs cases one at a time and turns every outcome into a [`Verdict`]
pub struct CaseExecutor {
    runner: DeadlineRunner,
    reporter: Option<Arc<dyn CaseReporter>>,
}

impl CaseExecutor {
    /// Create an executor from configuration
    pub fn new(config: &HarnessConfig) -> Self {
        let reporter: Option<Arc<dyn CaseReporter>> = if config.echo_output {
            Some(Arc::new(StdoutReporter))
        } else {
            None
        };

        Self {
            runner: DeadlineRunner::new(config.timeout_ceiling),
            reporter,
        }
    }

    /// Create an executor around a runner, with no reporter
    pub fn with_runner(runner: DeadlineRunner) -> Self {
        Self {
            runner,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn CaseReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn without_reporter(mut self) -> Self {
        self.reporter = None;
        self
    }

    pub fn runner(&self) -> &DeadlineRunner {
        &self.runner
    }

    /// Execute a single case, waiting for exclusive use of the console streams
    pub async fn execute(&self, case: Case) -> Verdict {
        let gate = StreamRedirector::lock().await;
        self.execute_locked(gate, case).await.0
    }

    /// Execute a single case with a gate the caller already holds, and hand
    /// the gate back afterwards
    pub async fn execute_locked(&self, gate: StreamGate, case: Case) -> (Verdict, StreamGate) {
        let span = tracing::info_span!("case", name = %case.name());

        async move {
            tracing::debug!(
                entry_point = case.entry_point().name(),
                timeout_ms = case.timeout().as_millis() as u64,
                "Running case"
            );

            let handle = StreamRedirector::acquire_with(gate, case.input());
            let outcome = self
                .runner
                .run(case.entry_point(), case.timeout(), handle.streams())
                .await;
            let (released, gate) = StreamRedirector::release_holding(handle);

            let verdict = judge(&case, outcome, released);
            match &verdict.failure {
                None => tracing::info!(elapsed_ms = verdict.elapsed_ms, "Case passed"),
                Some(reason) => tracing::warn!(
                    code = reason.code(),
                    elapsed_ms = verdict.elapsed_ms,
                    diagnostic = %verdict.diagnostic,
                    "Case failed"
                ),
            }

            if let Some(reporter) = &self.reporter {
                reporter.on_verdict(&verdict);
            }

            (verdict, gate)
        }
        .instrument(span)
        .await
    }
}

/// Turn a run outcome and the captured output into a verdict
fn judge(case: &Case, outcome: RunOutcome, released: Released) -> Verdict {
    let elapsed_ms = outcome.elapsed().as_millis() as u64;
    let comparison = normalize::compare(&released.captured, case.expected_output());

    let (failure, diagnostic) = match outcome {
        RunOutcome::Completed { .. } if comparison.matched => {
            (None, format!("Output matched in {elapsed_ms} ms"))
        }
        RunOutcome::Completed { .. } => (
            Some(FailureReason::AssertionMismatch {
                actual: comparison.actual.clone(),
                expected: comparison.expected.clone(),
            }),
            normalize::render_mismatch(&comparison),
        ),
        RunOutcome::TimedOut {
            limit, ceiling_hit, ..
        } => {
            let limit_ms = limit.as_millis() as u64;
            let which = if ceiling_hit {
                "absolute ceiling"
            } else {
                "case timeout"
            };
            (
                Some(FailureReason::TimeoutExceeded {
                    elapsed_ms,
                    limit_ms,
                    ceiling_hit,
                }),
                format!("Timed out after {elapsed_ms} ms ({which} is {limit_ms} ms)"),
            )
        }
        RunOutcome::Errored { cause, .. } => (
            Some(FailureReason::ExecutionError {
                cause: cause.clone(),
            }),
            format!("Solution failed after {elapsed_ms} ms: {cause}"),
        ),
    };

    Verdict {
        name: case.name().to_string(),
        passed: failure.is_none(),
        actual_normalized: comparison.actual,
        expected_normalized: comparison.expected,
        failure,
        elapsed_ms,
        diagnostic,
        captured_output: normalize::normalize(&released.captured),
        restore_error: released.restore_error.map(|e| e.to_string()),
    }
}
