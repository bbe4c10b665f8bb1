//! Logging initialisation and configuration.
//!
//! # Design
//! - One entry point installs the global subscriber (fmt or JSON) exactly once per process.
//! - `RUST_LOG` wins over the configured level.
//! - Logs go to stderr so command output on stdout stays machine-readable.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

/// Level filter applied when neither `RUST_LOG` nor settings pick one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// What [`init_logging`] installs.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// `EnvFilter` directive such as `info` or `consign_engine=debug`.
    pub level: &'a str,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
        }
    }
}

/// Log line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON for release builds.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse a configured format name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Derive the log format from an optional configured name, inferring it when absent or unknown.
#[must_use]
pub fn log_format_from_config(value: Option<&str>) -> LogFormat {
    value.and_then(LogFormat::parse).unwrap_or_else(LogFormat::infer)
}

/// Install the process-wide subscriber writing to stderr.
///
/// Calling this again after a successful installation is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::Subscriber`] if another subscriber was already installed
/// globally by someone else.
pub fn init_logging(config: &LoggingConfig<'_>) -> TelemetryResult<()> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }
    install_fmt_subscriber(config)?;
    INSTALLED.set(config.format).ok();
    Ok(())
}

/// Format installed by [`init_logging`], if any.
#[must_use]
pub fn installed_format() -> Option<LogFormat> {
    INSTALLED.get().copied()
}

fn install_fmt_subscriber(config: &LoggingConfig<'_>) -> TelemetryResult<()> {
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|source| TelemetryError::Subscriber { source })
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_variants() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" Pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);

        assert_eq!(log_format_from_config(Some("json")), LogFormat::Json);
        assert_eq!(log_format_from_config(Some("unknown")), LogFormat::infer());
        assert_eq!(log_format_from_config(None), LogFormat::infer());
    }

    #[test]
    fn init_logging_is_idempotent() {
        let config = LoggingConfig {
            level: "info",
            format: LogFormat::Pretty,
        };
        if init_logging(&config).is_ok() {
            assert_eq!(installed_format(), Some(LogFormat::Pretty));
            assert!(init_logging(&config).is_ok());
        }
    }
}
