//! # Design
//!
//! - Constant messages; paths, strategy names and offending values travel as fields.
//! - `describe` renders the context for per-file result records, which store text only.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors produced by transfer strategies and their registry.
#[derive(Debug, Error)]
pub enum TransferError {
    /// IO failures while materialising a file.
    #[error("transfer io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A strategy name was not registered.
    #[error("unknown transfer strategy")]
    UnknownStrategy {
        /// Name that failed to resolve.
        name: String,
    },
    /// A configured instance named a kind with no factory.
    #[error("unknown transfer strategy kind")]
    UnknownKind {
        /// Instance being configured.
        name: String,
        /// Kind that failed to resolve.
        kind: String,
    },
    /// Strategy options could not be decoded.
    #[error("invalid transfer strategy options")]
    Options {
        /// Instance being configured.
        name: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },
    /// Strategy options decoded but violate an invariant.
    #[error("invalid transfer strategy option")]
    InvalidOption {
        /// Instance being configured.
        name: String,
        /// Option that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The strategy cannot run on this platform.
    #[error("transfer operation unsupported")]
    Unsupported {
        /// Operation that is unsupported.
        operation: &'static str,
    },
}

impl TransferError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_option(
        name: &str,
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidOption {
            name: name.to_string(),
            field,
            reason,
            value,
        }
    }

    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Io {
                operation,
                path,
                source,
            } => format!("{self}: {operation} {}: {source}", path.display()),
            Self::UnknownStrategy { name } => format!("{self}: '{name}'"),
            Self::UnknownKind { name, kind } => format!("{self}: '{kind}' for '{name}'"),
            Self::Options { name, source } => format!("{self} for '{name}': {source}"),
            Self::InvalidOption {
                name,
                field,
                reason,
                value,
            } => value.as_deref().map_or_else(
                || format!("{self} for '{name}': {field} {reason}"),
                |value| format!("{self} for '{name}': {field} {reason} ('{value}')"),
            ),
            Self::Unsupported { operation } => format!("{self}: {operation}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_carries_context() {
        let err = TransferError::io(
            "copy.open_source",
            "/src/a.exr",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let text = err.describe();
        assert!(text.starts_with("transfer io failure"));
        assert!(text.contains("copy.open_source /src/a.exr"));
        assert!(text.contains("gone"));

        let err = TransferError::UnknownStrategy {
            name: "teleport".into(),
        };
        assert_eq!(err.describe(), "unknown transfer strategy: 'teleport'");

        let err = TransferError::invalid_option("split", "delimiter", "empty", None);
        assert_eq!(
            err.describe(),
            "invalid transfer strategy option for 'split': delimiter empty"
        );
    }
}
