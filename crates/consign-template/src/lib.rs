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

//! Template rendering for destination paths and delivery manifests.
//!
//! Layout: `render.rs` (path templates and filters), `sequence.rs` (frame-range grouping for
//! display), `manifest.rs` (manifest context and rendering), `error.rs`.

pub mod error;
pub mod manifest;
pub mod render;
pub mod sequence;

pub use error::{TemplateError, TemplateResult};
pub use manifest::{DEFAULT_MANIFEST_TEMPLATE, ManifestContext, render_manifest};
pub use render::{TemplateRenderer, render};
pub use sequence::{DisplayEntry, group_sequences};
