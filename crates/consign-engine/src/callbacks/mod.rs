//! Post-delivery callbacks.
//!
//! # Design
//! - Callbacks are looked up by name in a registry built at start-up; unknown names are reported
//!   and skipped.
//! - A callback receives the finished [`DeliveryResult`], its merged configuration and the dry-run
//!   flag. Under dry run a callback only logs what it would do.
//! - Callback failures are returned as [`CallbackError`] values and never change the result.

mod dispatch;
pub mod grist;
pub mod manifest;
pub mod mattermost;

use std::path::PathBuf;

use async_trait::async_trait;
use consign_model::{CallbackConfig, DeliveryResult};
use consign_template::TemplateError;
use serde_json::Value;
use thiserror::Error;

pub use dispatch::{CallbackDispatcher, CallbackRegistry, CallbackReport, merge_config};
pub use grist::GristUpdateCallback;
pub use manifest::ManifestCallback;
pub use mattermost::MattermostCallback;

/// Result alias for callback invocations.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Failures raised by a callback invocation.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// A required configuration key is absent or blank.
    #[error("callback option missing")]
    MissingOption {
        /// Callback name.
        callback: &'static str,
        /// Missing key.
        field: &'static str,
    },
    /// A configuration key has an unusable value.
    #[error("callback option invalid")]
    InvalidOption {
        /// Callback name.
        callback: &'static str,
        /// Offending key.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// The HTTP request could not be sent or its response read.
    #[error("callback request failed")]
    Http {
        /// Callback name.
        callback: &'static str,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The remote endpoint answered with a non-success status.
    #[error("callback endpoint rejected request")]
    Status {
        /// Callback name.
        callback: &'static str,
        /// HTTP status code.
        status: u16,
    },
    /// Writing a local artifact failed.
    #[error("callback io failure")]
    Io {
        /// Callback name.
        callback: &'static str,
        /// Path being written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Rendering a template failed.
    #[error("callback template failure")]
    Template {
        /// Callback name.
        callback: &'static str,
        /// Underlying template error.
        source: TemplateError,
    },
    /// No callback is registered under the requested name.
    #[error("unknown callback")]
    Unknown {
        /// Requested name.
        name: String,
    },
}

impl CallbackError {
    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::MissingOption { callback, field } => format!("{self}: {callback}.{field}"),
            Self::InvalidOption {
                callback,
                field,
                reason,
            } => format!("{self}: {callback}.{field} {reason}"),
            Self::Http { callback, source } => format!("{self} ({callback}): {source}"),
            Self::Status { callback, status } => format!("{self} ({callback}): status {status}"),
            Self::Io {
                callback,
                path,
                source,
            } => format!("{self} ({callback}): {}: {source}", path.display()),
            Self::Template { callback, source } => format!("{self} ({callback}): {source}"),
            Self::Unknown { name } => format!("{self}: '{name}'"),
        }
    }
}

/// A post-delivery action.
#[async_trait]
pub trait DeliveryCallback: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Act on a finished delivery.
    ///
    /// # Errors
    ///
    /// Returns a [`CallbackError`] when the action could not be completed.
    async fn invoke(
        &self,
        result: &DeliveryResult,
        config: &CallbackConfig,
        dry_run: bool,
    ) -> CallbackResult<()>;
}

/// Non-blank string option.
pub(crate) fn option_str<'a>(config: &'a CallbackConfig, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Required non-blank string option.
pub(crate) fn required_str<'a>(
    callback: &'static str,
    config: &'a CallbackConfig,
    key: &'static str,
) -> CallbackResult<&'a str> {
    option_str(config, key).ok_or(CallbackError::MissingOption {
        callback,
        field: key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: &Value) -> CallbackConfig {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn option_helpers_ignore_blank_and_non_string_values() {
        let cfg = config(&json!({ "a": " x ", "b": "  ", "c": 3 }));
        assert_eq!(option_str(&cfg, "a"), Some("x"));
        assert_eq!(option_str(&cfg, "b"), None);
        assert_eq!(option_str(&cfg, "c"), None);
        assert!(matches!(
            required_str("mattermost", &cfg, "webhook_url"),
            Err(CallbackError::MissingOption {
                field: "webhook_url",
                ..
            })
        ));
    }

    #[test]
    fn describe_names_the_callback() {
        let err = CallbackError::Status {
            callback: "grist_update",
            status: 500,
        };
        assert_eq!(
            err.describe(),
            "callback endpoint rejected request (grist_update): status 500"
        );
    }
}
