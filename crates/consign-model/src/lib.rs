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

//! Data contracts shared by every Consign crate.
//!
//! The package description (`DeliveryPackage`) is produced by an upstream record-source
//! connector and consumed by the engine; the result record (`DeliveryResult`) is produced by
//! the engine and consumed by callbacks and the calling process. Both serialize to JSON and
//! round-trip without loss.
//!
//! Layout: `package.rs` (input contract), `result.rs` (output contract), `error.rs`.

pub mod error;
pub mod package;
pub mod result;

pub use error::{ModelError, ModelResult};
pub use package::{
    CallbackConfig, DEFAULT_PROCESS_METHOD, DeliveryPackage, Metadata, PackageItem,
    ProcessMethod, validate_package_name,
};
pub use result::{DeliveryResult, ItemResult, summarize};
