//! Hard-deadline execution of solution entry points
//!
//! The entry point runs on its own OS thread, bound to the case's streams.
//! The caller waits on a oneshot channel under `tokio::time::timeout`, so the
//! wait ends on time no matter what the entry point is doing.
//!
//! Safe Rust cannot kill a thread. When the deadline passes the runner
//! closes the case's streams, which makes the worker's next console read
//! fail and its next `out!`/`outln!` unwind it. A worker that never touches
//! the console again is detached and left running in the background; it stays
//! bound to its closed streams and cannot reach a later case's buffers.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use crate::console::{self, StreamPair};
use crate::constants::{DEFAULT_TIMEOUT_CEILING_MS, WORKER_THREAD_NAME};
use crate::error::HarnessError;

type EntryFn = dyn Fn() -> anyhow::Result<()> + Send + Sync + 'static;

thread_local! {
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the existing one that remembers where the current
/// thread last panicked
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info.location().map(|l| l.to_string());
            PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            previous(info);
        }));
    });
}

/// A solution's zero-argument entry point.
///
/// Returning `Err` or panicking both count as an execution error. Cheap to
/// clone; every case of a suite shares the same function.
#[derive(Clone)]
pub struct EntryPoint {
    name: Arc<str>,
    func: Arc<EntryFn>,
}

impl EntryPoint {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn call(&self) -> anyhow::Result<()> {
        (self.func)()
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint").field("name", &self.name).finish()
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The entry point returned `Ok` before the deadline
    Completed { elapsed: Duration },
    /// The deadline passed first
    TimedOut {
        elapsed: Duration,
        /// The limit that was actually enforced
        limit: Duration,
        /// True when the absolute ceiling, not the case's own timeout, was that limit
        ceiling_hit: bool,
    },
    /// The entry point returned `Err`, panicked, or could not be started
    Errored { elapsed: Duration, cause: String },
}

impl RunOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Completed { elapsed }
            | Self::TimedOut { elapsed, .. }
            | Self::Errored { elapsed, .. } => *elapsed,
        }
    }
}

/// Runs entry points under a per-case timeout capped by an absolute ceiling
#[derive(Debug, Clone)]
pub struct DeadlineRunner {
    ceiling: Duration,
}

impl Default for DeadlineRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_CEILING_MS))
    }
}

impl DeadlineRunner {
    pub fn new(ceiling: Duration) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// The limit enforced for `timeout`, and whether the ceiling supplied it
    pub fn effective_limit(&self, timeout: Duration) -> (Duration, bool) {
        if timeout > self.ceiling {
            (self.ceiling, true)
        } else {
            (timeout, false)
        }
    }

    /// Run `entry` on a dedicated thread bound to `streams` and wait at most
    /// `min(timeout, ceiling)` for it.
    pub async fn run(&self, entry: &EntryPoint, timeout: Duration, streams: StreamPair) -> RunOutcome {
        let (limit, ceiling_applies) = self.effective_limit(timeout);
        let (tx, rx) = oneshot::channel();
        let start = Instant::now();

        install_panic_hook();
        let worker_entry = entry.clone();
        let worker_streams = streams.clone();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                console::bind_thread(worker_streams);
                PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
                let result = panic::catch_unwind(AssertUnwindSafe(|| worker_entry.call()))
                    .map_err(|payload| describe_panic(payload.as_ref()));
                // the receiver is gone once the caller gave up waiting
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            return RunOutcome::Errored {
                elapsed: start.elapsed(),
                cause: HarnessError::Spawn(e.to_string()).to_string(),
            };
        }

        match tokio::time::timeout(limit, rx).await {
            Ok(Ok(Ok(Ok(())))) => RunOutcome::Completed {
                elapsed: start.elapsed(),
            },
            Ok(Ok(Ok(Err(error)))) => RunOutcome::Errored {
                elapsed: start.elapsed(),
                cause: format!("{error:?}"),
            },
            Ok(Ok(Err(cause))) => RunOutcome::Errored {
                elapsed: start.elapsed(),
                cause,
            },
            Ok(Err(_)) => RunOutcome::Errored {
                elapsed: start.elapsed(),
                cause: "case worker exited without reporting a result".to_string(),
            },
            Err(_) => {
                streams.interrupt();
                let elapsed = start.elapsed();
                tracing::warn!(
                    entry_point = entry.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    limit_ms = limit.as_millis() as u64,
                    ceiling_hit = ceiling_applies,
                    "Deadline passed, abandoning case worker"
                );
                RunOutcome::TimedOut {
                    elapsed,
                    limit,
                    ceiling_hit: ceiling_applies,
                }
            }
        }
    }
}

/// `panicked at <file:line:col>: <message>`, using the location the hook
/// recorded on this thread
fn describe_panic(payload: &(dyn Any + Send)) -> String {
    let message = panic_message(payload);
    match PANIC_LOCATION.with(|slot| slot.borrow_mut().take()) {
        Some(location) => format!("panicked at {location}: {message}"),
        None => format!("panicked: {message}"),
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
