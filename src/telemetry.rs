//! Tracing subscriber setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{HarnessConfig, LogFormat};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when it parses; otherwise the configured filter is used.
/// Calling this more than once (say, from several test binaries sharing a
/// helper) leaves the first subscriber in place.
pub fn init(config: &HarnessConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.rust_log.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(filter = %config.rust_log, format = ?config.log_format, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        let json = HarnessConfig {
            log_format: LogFormat::Json,
            ..HarnessConfig::default()
        };
        init(&json);
        init(&HarnessConfig::default());
        tracing::info!("still logging");
    }
}
