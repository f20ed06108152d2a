//! Harness-wide constants
//!
//! Defaults for configuration values and the environment variable names
//! they are read from. Constants are grouped by their purpose.

// =============================================================================
// TIMEOUT DEFAULTS
// =============================================================================

/// Default per-case timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 1.0;

/// Absolute ceiling for a single case in milliseconds, independent of the
/// per-case timeout
pub const DEFAULT_TIMEOUT_CEILING_MS: u64 = 10_000;

/// Name given to the worker thread that runs a solution's entry point
pub const WORKER_THREAD_NAME: &str = "psjudge-case";

// =============================================================================
// DISPLAY
// =============================================================================

/// Number of input characters shown in a case's display name
pub const DISPLAY_PREVIEW_CHARS: usize = 30;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Environment variable names read by [`crate::config::HarnessConfig::from_env`]
pub mod env_keys {
    pub const TIMEOUT_CEILING_MS: &str = "PSJUDGE_TIMEOUT_CEILING_MS";
    pub const DEFAULT_TIMEOUT_SECONDS: &str = "PSJUDGE_DEFAULT_TIMEOUT_SECONDS";
    pub const ECHO_OUTPUT: &str = "PSJUDGE_ECHO_OUTPUT";
    pub const FAIL_FAST: &str = "PSJUDGE_FAIL_FAST";
    pub const LOG_FORMAT: &str = "PSJUDGE_LOG_FORMAT";
    pub const RUST_LOG: &str = "RUST_LOG";
    /// Read by the sample runner only
    pub const REPORT_JSON: &str = "PSJUDGE_REPORT_JSON";
}
