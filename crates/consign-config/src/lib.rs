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

//! Settings for Consign deliveries, loaded from YAML.
//!
//! Layout: `model.rs` (typed document and defaults), `loader.rs` (file loading),
//! `validate.rs`, `error.rs`.

pub mod error;
mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::SettingsOrigin;
pub use model::{
    DEFAULT_LOG_LEVEL, DEFAULT_STORAGE_ROOT, LOG_FORMATS, LoggingSettings, PathSettings,
    Settings, StorageSettings, StrategySettings,
};
