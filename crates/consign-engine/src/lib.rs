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

//! Delivery orchestration for Consign.
//!
//! [`DeliveryEngine`] turns a [`consign_model::DeliveryPackage`] into a
//! [`consign_model::DeliveryResult`]: it resolves item sources to files, renders each
//! destination, runs the item's transfer strategy chain and records one outcome per file. Once the
//! result is final, the [`callbacks`] requested by the package run against it.
//!
//! Layout: `engine.rs` (orchestrator), `resolve.rs` (file enumeration and metadata views),
//! `callbacks/` (dispatcher and built-in callbacks), `error.rs`.

pub mod callbacks;
pub mod engine;
pub mod error;
pub mod resolve;

pub use callbacks::{
    CallbackDispatcher, CallbackError, CallbackRegistry, CallbackReport, CallbackResult,
    DeliveryCallback,
};
pub use engine::{
    DeliveryEngine, MANIFEST_FILE_NAME, SOURCE_NOT_FOUND, TIMESTAMP_FORMAT, strategy_registry,
};
pub use error::{EngineError, EngineResult};
