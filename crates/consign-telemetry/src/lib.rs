#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Logging and metrics shared across the Consign workspace.
//!
//! Libraries only emit `tracing` events and receive a [`Metrics`] handle; the binary owns the
//! one-time subscriber installation.

pub mod error;
pub mod init;
pub mod metrics;

pub use error::{CollectorStage, TelemetryError, TelemetryResult};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging, installed_format,
    log_format_from_config,
};
pub use metrics::{Metrics, MetricsSnapshot};
