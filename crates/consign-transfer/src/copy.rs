//! Copy strategy: duplicate content, then preserve permissions and modification time best-effort.
//!
//! Content is written to a temporary file beside the destination and renamed into place, so a
//! failed copy never leaves a truncated file at the destination.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use consign_template::TemplateRenderer;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};
use crate::strategy::{
    StrategyOptions, TransferOutcome, TransferRequest, TransferStrategy, decode_options,
    ensure_parent, retarget,
};

/// Kind name of the copy strategy.
pub const COPY_KIND: &str = "copy";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CopyOptions {
    #[serde(default)]
    template: Option<String>,
}

/// Duplicates the source file at the destination.
#[derive(Debug, Clone, Default)]
pub struct CopyStrategy {
    template: Option<String>,
    renderer: TemplateRenderer,
}

impl CopyStrategy {
    /// Copy strategy that keeps the proposed file name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the destination file name with `template`.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Build an instance from settings options (`template`).
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Options`] for unknown or mistyped options.
    pub fn from_options(name: &str, options: &StrategyOptions) -> TransferResult<Self> {
        let options: CopyOptions = decode_options(name, options)?;
        Ok(Self {
            template: options.template,
            renderer: TemplateRenderer::new(),
        })
    }
}

impl TransferStrategy for CopyStrategy {
    fn kind(&self) -> &'static str {
        COPY_KIND
    }

    fn transfer(&self, request: TransferRequest<'_>) -> TransferResult<TransferOutcome> {
        let destination = retarget(COPY_KIND, &self.renderer, self.template.as_deref(), &request);
        if request.dry_run {
            info!(
                source = %request.source.display(),
                destination = %destination.display(),
                "dry run: copy skipped"
            );
            return Ok(TransferOutcome::unchanged(destination, &request));
        }

        ensure_parent("copy.create_parent", &destination)?;
        copy_atomic(request.source, &destination)?;
        debug!(
            source = %request.source.display(),
            destination = %destination.display(),
            "file copied"
        );
        Ok(TransferOutcome::unchanged(destination, &request))
    }
}

fn copy_atomic(source: &Path, destination: &Path) -> TransferResult<()> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut input =
        File::open(source).map_err(|err| TransferError::io("copy.open_source", source, err))?;
    let source_meta = input
        .metadata()
        .map_err(|err| TransferError::io("copy.stat_source", source, err))?;
    if !source_meta.is_file() {
        return Err(TransferError::io(
            "copy.stat_source",
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "source is not a regular file"),
        ));
    }

    let mut staged = tempfile::Builder::new()
        .prefix(".consign-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|err| TransferError::io("copy.create_staging", parent, err))?;
    io::copy(&mut input, staged.as_file_mut())
        .map_err(|err| TransferError::io("copy.write", destination, err))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|err| TransferError::io("copy.sync", destination, err))?;

    preserve_metadata(staged.as_file(), &source_meta, destination);

    staged
        .persist(destination)
        .map_err(|err| TransferError::io("copy.persist", destination, err.error))?;
    Ok(())
}

// Permissions and mtime are not supported by every network filesystem; content already landed.
fn preserve_metadata(staged: &File, source_meta: &fs::Metadata, destination: &Path) {
    if let Err(err) = staged.set_permissions(source_meta.permissions()) {
        warn!(
            destination = %destination.display(),
            error = %err,
            "failed to preserve permissions"
        );
    }
    match source_meta.modified() {
        Ok(modified) => {
            if let Err(err) = staged.set_modified(modified) {
                warn!(
                    destination = %destination.display(),
                    error = %err,
                    "failed to preserve modification time"
                );
            }
        }
        Err(err) => warn!(
            destination = %destination.display(),
            error = %err,
            "source modification time unavailable"
        ),
    }
}
