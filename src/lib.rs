//! psjudge - In-process judge harness for problem-solving programs
//!
//! Runs a solution's entry point against a fixed input, captures what it
//! prints, and compares the normalized output with the expected answer under a
//! hard per-case deadline.
//!
//! # Pipeline
//!
//! - **Console**: the one place solutions read input from and print answers to
//! - **Redirect**: swaps the process-wide console streams for one case and
//!   always puts them back
//! - **Deadline**: runs the entry point on its own thread and stops waiting
//!   when the time is up
//! - **Normalize**: ignores trailing whitespace per line, nothing else
//! - **Executor**: ties the above together and produces a verdict
//!
//! Suites replace declarative test configuration: a solution, a timeout and a
//! list of (input, expected output) pairs, run strictly one case at a time.

pub mod case;
pub mod config;
pub mod console;
pub mod constants;
pub mod deadline;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod redirect;
pub mod reporter;
pub mod samples;
pub mod suite;
pub mod telemetry;
pub mod verdict;

// Re-export commonly used types
pub use case::Case;
pub use config::{HarnessConfig, LogFormat};
pub use deadline::{DeadlineRunner, EntryPoint, RunOutcome};
pub use error::{HarnessError, HarnessResult};
pub use executor::CaseExecutor;
pub use redirect::{RedirectionHandle, StreamRedirector};
pub use reporter::{CaseReporter, StdoutReporter};
pub use suite::{Suite, SuiteBuilder};
pub use verdict::{FailureReason, SuiteReport, Verdict};
