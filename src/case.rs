//! A single resolved case

use std::time::Duration;

use crate::constants::DISPLAY_PREVIEW_CHARS;
use crate::deadline::EntryPoint;
use crate::error::{HarnessError, HarnessResult};

/// One (input, expected output, timeout, entry point) unit of work.
///
/// Immutable once built and consumed by [`crate::executor::CaseExecutor::execute`].
#[derive(Debug, Clone)]
pub struct Case {
    name: String,
    input: String,
    expected_output: String,
    timeout: Duration,
    entry_point: EntryPoint,
}

impl Case {
    /// Build a case, rejecting timeouts that are not finite and positive
    pub fn new(
        name: impl Into<String>,
        input: impl Into<String>,
        expected_output: impl Into<String>,
        timeout_seconds: f64,
        entry_point: EntryPoint,
    ) -> HarnessResult<Self> {
        let timeout = timeout_from_seconds(timeout_seconds)?;
        Ok(Self::from_parts(name, input, expected_output, timeout, entry_point))
    }

    /// Build a case from an already validated timeout
    pub(crate) fn from_parts(
        name: impl Into<String>,
        input: impl Into<String>,
        expected_output: impl Into<String>,
        timeout: Duration,
        entry_point: EntryPoint,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            expected_output: expected_output.into(),
            timeout,
            entry_point,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry_point
    }
}

/// Convert a timeout in (possibly fractional) seconds to a `Duration`
pub fn timeout_from_seconds(seconds: f64) -> HarnessResult<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(HarnessError::MisconfiguredCase(format!(
            "timeout must be a positive number of seconds, got {seconds}"
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| HarnessError::MisconfiguredCase(format!("timeout {seconds}s: {e}")))
}

/// `[index] input: preview`, with the input cut to a short single-line preview
pub fn display_name(index: usize, input: &str) -> String {
    let preview = if input.chars().count() > DISPLAY_PREVIEW_CHARS {
        let head: String = input.chars().take(DISPLAY_PREVIEW_CHARS).collect();
        format!("{}...", head.replace('\n', "\\n"))
    } else {
        input.replace('\n', "\\n")
    };
    format!("[{index}] input: {preview}")
}
