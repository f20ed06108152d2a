//! Harness error types
//!
//! Per-case failures (timeouts, solution errors, wrong output) are never
//! errors: they become a [`crate::verdict::Verdict`]. What remains here are
//! setup defects, console read failures seen by solutions, and problems in the
//! harness's own plumbing. Configuration has its own
//! [`crate::config::ConfigError`].

/// Harness-wide error type
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A case or suite was declared in a way that cannot run
    #[error("Misconfigured case: {0}")]
    MisconfiguredCase(String),

    /// A solution asked for another token after the input ran out
    #[error("Input exhausted")]
    InputExhausted,

    /// A token could not be parsed into the requested type
    #[error("Invalid token {token:?} for type {target}")]
    InvalidToken { token: String, target: &'static str },

    /// The process-wide streams were not in the state the handle left them in
    #[error("Stream restoration failed: {0}")]
    RedirectionRestore(String),

    /// The worker thread for a case could not be started
    #[error("Failed to spawn case worker: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MisconfiguredCase(_) => "MISCONFIGURED_CASE",
            Self::InputExhausted => "INPUT_EXHAUSTED",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::RedirectionRestore(_) => "REDIRECTION_RESTORE",
            Self::Spawn(_) => "SPAWN_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using HarnessError
pub type HarnessResult<T> = Result<T, HarnessError>;
