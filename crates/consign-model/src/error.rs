//! # Design
//!
//! - Constant error messages; the offending field and value travel as context.
//! - Only input-contract problems live here. Per-file failures are data, not errors.

use thiserror::Error;

/// Result alias for contract parsing and validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing or validating the delivery contracts.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The JSON document could not be decoded.
    #[error("malformed delivery document")]
    Parse {
        /// Document kind being decoded (`package` or `result`).
        document: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Encoding a contract to JSON failed.
    #[error("delivery document encoding failed")]
    Encode {
        /// Document kind being encoded.
        document: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The package description violated an invariant.
    #[error("invalid package description")]
    InvalidPackage {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ModelError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: Option<&str>) -> Self {
        Self::InvalidPackage {
            field,
            reason,
            value: value.map(ToOwned::to_owned),
        }
    }

    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Parse { document, source } | Self::Encode { document, source } => {
                format!("{self} ({document}): {source}")
            }
            Self::InvalidPackage {
                field,
                reason,
                value,
            } => value.as_deref().map_or_else(
                || format!("{self}: {field} {reason}"),
                |value| format!("{self}: {field} {reason} ('{value}')"),
            ),
        }
    }
}
