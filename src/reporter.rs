//! Hand-off of finished verdicts to whatever displays them

use std::io;

use crate::console::OutputSink;
use crate::verdict::Verdict;

/// Receives every verdict after the console streams have been restored
#[cfg_attr(test, mockall::automock)]
pub trait CaseReporter: Send + Sync {
    fn on_verdict(&self, verdict: &Verdict);
}

/// Echoes each case's captured output to the real standard output
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl StdoutReporter {
    fn echo(&self, verdict: &Verdict) -> io::Result<()> {
        let sink = OutputSink::stdout();
        sink.write_fmt(format_args!("{verdict}\n"))?;
        if !verdict.captured_output.is_empty() {
            sink.write_fmt(format_args!("{}\n", verdict.captured_output))?;
        }
        sink.flush()
    }
}

impl CaseReporter for StdoutReporter {
    fn on_verdict(&self, verdict: &Verdict) {
        if let Err(e) = self.echo(verdict) {
            tracing::warn!(case = %verdict.name, error = %e, "Failed to echo captured output");
        }
    }
}
