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
#![allow(clippy::module_name_repetitions, clippy::redundant_pub_crate)]

//! Command-line entry point for Consign deliveries.
//!
//! Layout:
//! - `cli.rs`: argument parsing, settings and logging set-up, command dispatch
//! - `commands/`: command handlers
//! - `output.rs`: renderers and file output helpers
//! - `error.rs`: exit-code mapping
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod output;

pub use cli::run;
