//! Harness configuration management
//!
//! Configuration is read from environment variables (optionally seeded from a
//! `.env` file) once, before any case runs.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    env_keys, DEFAULT_LOG_FILTER, DEFAULT_TIMEOUT_CEILING_MS, DEFAULT_TIMEOUT_SECONDS,
};

/// Main harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Absolute ceiling for any single case, whatever its own timeout says
    pub timeout_ceiling: Duration,
    /// Timeout applied to suites that do not set one
    pub default_timeout_seconds: f64,
    /// Echo each case's captured output to the real stdout after restoration
    pub echo_output: bool,
    /// Stop a suite after its first failing case
    pub fail_fast: bool,
    /// Log filter used when `RUST_LOG` does not parse
    pub rust_log: String,
    /// Human-readable or JSON log lines on stderr
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout_ceiling: Duration::from_millis(DEFAULT_TIMEOUT_CEILING_MS),
            default_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            echo_output: true,
            fail_fast: false,
            rust_log: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to their defaults; present keys must parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ceiling_ms: u64 = parse_or(&lookup, env_keys::TIMEOUT_CEILING_MS, DEFAULT_TIMEOUT_CEILING_MS)?;
        if ceiling_ms == 0 {
            return Err(ConfigError::InvalidValue(env_keys::TIMEOUT_CEILING_MS.to_string()));
        }

        let default_timeout_seconds: f64 =
            parse_or(&lookup, env_keys::DEFAULT_TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECONDS)?;
        if !default_timeout_seconds.is_finite() || default_timeout_seconds <= 0.0 {
            return Err(ConfigError::InvalidValue(
                env_keys::DEFAULT_TIMEOUT_SECONDS.to_string(),
            ));
        }

        Ok(Self {
            timeout_ceiling: Duration::from_millis(ceiling_ms),
            default_timeout_seconds,
            echo_output: parse_flag(&lookup, env_keys::ECHO_OUTPUT, true)?,
            fail_fast: parse_flag(&lookup, env_keys::FAIL_FAST, false)?,
            rust_log: lookup(env_keys::RUST_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_format: parse_or(&lookup, env_keys::LOG_FORMAT, LogFormat::Text)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = HarnessConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.timeout_ceiling, Duration::from_secs(10));
        assert_eq!(config.default_timeout_seconds, 1.0);
        assert!(config.echo_output);
        assert!(!config.fail_fast);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("PSJUDGE_TIMEOUT_CEILING_MS", "2500"),
            ("PSJUDGE_DEFAULT_TIMEOUT_SECONDS", "0.25"),
            ("PSJUDGE_ECHO_OUTPUT", "off"),
            ("PSJUDGE_FAIL_FAST", "1"),
            ("PSJUDGE_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.timeout_ceiling, Duration::from_millis(2500));
        assert_eq!(config.default_timeout_seconds, 0.25);
        assert!(!config.echo_output);
        assert!(config.fail_fast);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        let err = HarnessConfig::from_lookup(lookup_from(&[("PSJUDGE_TIMEOUT_CEILING_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "PSJUDGE_TIMEOUT_CEILING_MS"));

        assert!(HarnessConfig::from_lookup(lookup_from(&[("PSJUDGE_TIMEOUT_CEILING_MS", "0")])).is_err());
        assert!(HarnessConfig::from_lookup(lookup_from(&[("PSJUDGE_DEFAULT_TIMEOUT_SECONDS", "-1")])).is_err());
        assert!(HarnessConfig::from_lookup(lookup_from(&[("PSJUDGE_ECHO_OUTPUT", "maybe")])).is_err());
        let err = HarnessConfig::from_lookup(lookup_from(&[("PSJUDGE_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "PSJUDGE_LOG_FORMAT"));
    }
}
