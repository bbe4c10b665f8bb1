//! Error types for settings loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("settings file unreadable")]
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The settings document is not valid YAML for the settings schema.
    #[error("malformed settings document")]
    Yaml {
        /// Settings file path, when loaded from disk.
        path: Option<PathBuf>,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: &'static str,
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section,
            field: field.into(),
            value,
            reason,
        }
    }

    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Io { path, source } => format!("{self}: {}: {source}", path.display()),
            Self::Yaml { path, source } => path.as_ref().map_or_else(
                || format!("{self}: {source}"),
                |path| format!("{self}: {}: {source}", path.display()),
            ),
            Self::InvalidField {
                section,
                field,
                value,
                reason,
            } => value.as_deref().map_or_else(
                || format!("{self}: {section}.{field} {reason}"),
                |value| format!("{self}: {section}.{field} {reason} ('{value}')"),
            ),
        }
    }
}
