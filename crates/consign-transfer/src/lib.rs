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

//! Transfer strategies that materialise one source file at a delivery destination.
//!
//! Layout: `strategy.rs` (trait and request/outcome types), `copy.rs`, `symlink.rs`,
//! `tokenize.rs`, `registry.rs` (name-keyed lookup), `error.rs`.

pub mod copy;
pub mod error;
pub mod registry;
pub mod strategy;
pub mod symlink;
pub mod tokenize;

pub use copy::{COPY_KIND, CopyStrategy};
pub use error::{TransferError, TransferResult};
pub use registry::{SharedStrategy, StrategyFactory, StrategyInfo, StrategyRegistry};
pub use strategy::{StrategyOptions, TransferOutcome, TransferRequest, TransferStrategy};
pub use symlink::{SYMLINK_KIND, SymlinkStrategy};
pub use tokenize::{TOKENIZE_KIND, TokenizeStrategy};
