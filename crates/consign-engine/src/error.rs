//! # Design
//!
//! - Only start-up and package-level problems are errors; per-file failures become failed
//!   `ItemResult`s and callback failures are reported, never raised.
//! - Constant messages with structured context, like the other workspace crates.

use std::io;
use std::path::PathBuf;

use consign_model::ModelError;
use consign_transfer::TransferError;
use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal errors raised by the delivery engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The package cannot be delivered as described.
    #[error("invalid delivery package")]
    InvalidPackage {
        /// Underlying validation error.
        source: ModelError,
    },
    /// The delivery folder could not be created.
    #[error("delivery folder unavailable")]
    DeliveryRoot {
        /// Delivery folder path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A configured strategy instance could not be built.
    #[error("strategy configuration rejected")]
    StrategyConfig {
        /// Instance name from settings.
        name: String,
        /// Underlying registry error.
        source: TransferError,
    },
    /// The HTTP client used by callbacks could not be built.
    #[error("callback http client unavailable")]
    HttpClient {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

impl EngineError {
    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::InvalidPackage { source } => format!("{self}: {}", source.describe()),
            Self::DeliveryRoot { path, source } => {
                format!("{self}: {}: {source}", path.display())
            }
            Self::StrategyConfig { name, source } => {
                format!("{self} ('{name}'): {}", source.describe())
            }
            Self::HttpClient { source } => format!("{self}: {source}"),
        }
    }
}
