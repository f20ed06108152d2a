//! Scoped redirection of the process-wide console streams
//!
//! [`StreamRedirector::acquire`] swaps in case-local streams and returns a
//! [`RedirectionHandle`]; [`StreamRedirector::release`] puts the previous
//! streams back and hands over the captured text. A handle that is dropped
//! without an explicit release restores the streams in `Drop`, so every exit
//! path ends with the original streams in place.
//!
//! Every handle is created from a [`StreamGate`], the process-wide right to
//! touch the streams. Only one gate exists at a time, so only one handle does
//! too, and the next case's `acquire` happens-after this case's release.

use std::sync::{Arc, LazyLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::console::{self, OutputSink, StreamPair};
use crate::error::HarnessError;

static GATE: LazyLock<Arc<Mutex<()>>> = LazyLock::new(|| Arc::new(Mutex::new(())));

/// Exclusive access to the process-wide console streams
#[derive(Debug)]
pub struct StreamGate {
    _guard: OwnedMutexGuard<()>,
}

/// Owns the swap of the process-wide stream pair
pub struct StreamRedirector;

impl StreamRedirector {
    /// Wait until no other gate or handle is alive and take the gate
    pub async fn lock() -> StreamGate {
        StreamGate {
            _guard: GATE.clone().lock_owned().await,
        }
    }

    /// Swap the process-wide streams for a view over `input` and a fresh
    /// capture buffer. Waits until no other handle is active.
    pub async fn acquire(input: &str) -> RedirectionHandle {
        Self::acquire_with(Self::lock().await, input)
    }

    /// Same as [`StreamRedirector::acquire`], with a gate the caller already holds
    pub fn acquire_with(gate: StreamGate, input: &str) -> RedirectionHandle {
        let streams = StreamPair::for_case(input);
        let prior = console::replace_global(streams.clone());

        tracing::trace!(input_bytes = input.len(), "Console streams redirected");

        RedirectionHandle {
            redirection: Redirection {
                prior: Some(prior),
                streams,
            },
            gate,
        }
    }

    /// Restore the streams that were active before `acquire` and return what
    /// the case wrote. The gate is released too.
    pub fn release(handle: RedirectionHandle) -> Released {
        Self::release_holding(handle).0
    }

    /// Restore like [`StreamRedirector::release`] but keep the gate, so the
    /// caller can inspect the restored streams or start the next case without
    /// anyone slipping in between.
    pub fn release_holding(handle: RedirectionHandle) -> (Released, StreamGate) {
        let RedirectionHandle {
            mut redirection,
            gate,
        } = handle;
        let restore_error = redirection.restore();
        let captured =
            String::from_utf8_lossy(&redirection.streams.output.captured()).into_owned();

        (
            Released {
                captured,
                restore_error,
            },
            gate,
        )
    }
}

/// Exclusive ownership of the redirected streams for one case
///
/// Dropping the handle restores the streams before the gate is let go.
pub struct RedirectionHandle {
    redirection: Redirection,
    gate: StreamGate,
}

impl RedirectionHandle {
    /// The case-local streams, for binding the worker thread
    pub fn streams(&self) -> StreamPair {
        self.redirection.streams.clone()
    }

    /// The sink that was active before this handle was acquired
    pub fn prior_output(&self) -> Option<OutputSink> {
        self.redirection
            .prior
            .as_ref()
            .map(|pair| pair.output.clone())
    }
}

struct Redirection {
    prior: Option<StreamPair>,
    streams: StreamPair,
}

impl Redirection {
    /// Put the prior pair back and close the case's streams. Idempotent.
    fn restore(&mut self) -> Option<HarnessError> {
        let prior = self.prior.take()?;
        let displaced = console::replace_global(prior);
        self.streams.interrupt();

        if displaced.same_as(&self.streams) {
            tracing::trace!("Console streams restored");
            None
        } else {
            let error = HarnessError::RedirectionRestore(
                "process-wide streams were replaced while the case was running".to_string(),
            );
            tracing::warn!(error = %error, "Restored console streams over a foreign pair");
            Some(error)
        }
    }
}

impl Drop for Redirection {
    fn drop(&mut self) {
        self.restore();
    }
}

/// What `release` hands back
#[derive(Debug)]
pub struct Released {
    /// Captured output decoded as UTF-8 (invalid sequences replaced)
    pub captured: String,
    /// Set when restoration found the streams in an unexpected state
    pub restore_error: Option<HarnessError>,
}
