//! Symlink strategy: link the destination to the source instead of duplicating content.

use std::fs;
use std::io;
use std::path::Path;

use consign_template::TemplateRenderer;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{TransferError, TransferResult};
use crate::strategy::{
    StrategyOptions, TransferOutcome, TransferRequest, TransferStrategy, decode_options,
    ensure_parent, retarget,
};

/// Kind name of the symlink strategy.
pub const SYMLINK_KIND: &str = "symlink";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SymlinkOptions {
    #[serde(default)]
    template: Option<String>,
}

/// Creates a symbolic link at the destination pointing at the absolute source path.
#[derive(Debug, Clone, Default)]
pub struct SymlinkStrategy {
    template: Option<String>,
    renderer: TemplateRenderer,
}

impl SymlinkStrategy {
    /// Symlink strategy that keeps the proposed file name.
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
        let options: SymlinkOptions = decode_options(name, options)?;
        Ok(Self {
            template: options.template,
            renderer: TemplateRenderer::new(),
        })
    }
}

impl TransferStrategy for SymlinkStrategy {
    fn kind(&self) -> &'static str {
        SYMLINK_KIND
    }

    fn transfer(&self, request: TransferRequest<'_>) -> TransferResult<TransferOutcome> {
        let destination = retarget(
            SYMLINK_KIND,
            &self.renderer,
            self.template.as_deref(),
            &request,
        );
        if request.dry_run {
            info!(
                source = %request.source.display(),
                destination = %destination.display(),
                "dry run: symlink skipped"
            );
            return Ok(TransferOutcome::unchanged(destination, &request));
        }

        let target = std::path::absolute(request.source)
            .map_err(|err| TransferError::io("symlink.resolve_source", request.source, err))?;
        ensure_parent("symlink.create_parent", &destination)?;
        remove_existing(&destination)?;
        create_link(&target, &destination)?;
        debug!(
            source = %target.display(),
            destination = %destination.display(),
            "symlink created"
        );
        Ok(TransferOutcome::unchanged(destination, &request))
    }
}

// Removes a file or link (dangling included) at `destination`; real directories are an error.
fn remove_existing(destination: &Path) -> TransferResult<()> {
    match fs::symlink_metadata(destination) {
        Ok(_) => fs::remove_file(destination)
            .map_err(|err| TransferError::io("symlink.remove_existing", destination, err)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(TransferError::io("symlink.stat_existing", destination, err)),
    }
}

#[cfg(unix)]
fn create_link(target: &Path, destination: &Path) -> TransferResult<()> {
    std::os::unix::fs::symlink(target, destination)
        .map_err(|err| TransferError::io("symlink.create", destination, err))
}

#[cfg(not(unix))]
fn create_link(_target: &Path, _destination: &Path) -> TransferResult<()> {
    Err(TransferError::Unsupported {
        operation: "symlink.create",
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_model::Metadata;
    use tempfile::TempDir;

    fn temp_dir() -> Result<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix("consign-symlink-")
            .tempdir()?)
    }

    fn link(source: &Path, destination: &Path, dry_run: bool) -> TransferResult<TransferOutcome> {
        let metadata = Metadata::new();
        SymlinkStrategy::new().transfer(TransferRequest {
            source,
            destination,
            metadata: &metadata,
            dry_run,
        })
    }

    #[test]
    fn creates_link_to_source() -> Result<()> {
        let dir = temp_dir()?;
        let source = dir.path().join("plate.exr");
        fs::write(&source, "pixels")?;
        let destination = dir.path().join("out/plate.exr");

        let outcome = link(&source, &destination, false)?;
        assert_eq!(outcome.destination, destination);
        assert!(fs::symlink_metadata(&destination)?.file_type().is_symlink());
        assert_eq!(fs::read_link(&destination)?, source);
        assert_eq!(fs::read_to_string(&destination)?, "pixels");
        Ok(())
    }

    #[test]
    fn relinking_replaces_previous_link() -> Result<()> {
        let dir = temp_dir()?;
        let first = dir.path().join("v001.exr");
        let second = dir.path().join("v002.exr");
        fs::write(&first, "one")?;
        fs::write(&second, "two")?;
        let destination = dir.path().join("out/current.exr");

        link(&first, &destination, false)?;
        link(&second, &destination, false)?;
        assert_eq!(fs::read_link(&destination)?, second);
        assert_eq!(fs::read_to_string(&destination)?, "two");
        Ok(())
    }

    #[test]
    fn stale_links_and_plain_files_are_replaced() -> Result<()> {
        let dir = temp_dir()?;
        let source = dir.path().join("a.txt");
        fs::write(&source, "a")?;
        fs::create_dir_all(dir.path().join("out"))?;

        let stale = dir.path().join("out/stale.txt");
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), &stale)?;
        link(&source, &stale, false)?;
        assert_eq!(fs::read_link(&stale)?, source);

        let plain = dir.path().join("out/plain.txt");
        fs::write(&plain, "old")?;
        link(&source, &plain, false)?;
        assert_eq!(fs::read_link(&plain)?, source);
        Ok(())
    }

    #[test]
    fn dry_run_creates_nothing() -> Result<()> {
        let dir = temp_dir()?;
        let source = dir.path().join("a.txt");
        fs::write(&source, "a")?;
        let destination = dir.path().join("out/a.txt");
        link(&source, &destination, true)?;
        assert!(!dir.path().join("out").exists());
        Ok(())
    }
}
