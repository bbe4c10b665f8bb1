//! The transfer capability shared by every strategy.

use std::fs;
use std::path::{Path, PathBuf};

use consign_model::Metadata;
use consign_template::TemplateRenderer;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{TransferError, TransferResult};

/// Free-form options attached to a strategy instance in settings.
pub type StrategyOptions = serde_json::Map<String, Value>;

/// Inputs for one strategy invocation on one file.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// File being delivered.
    pub source: &'a Path,
    /// Destination proposed by the engine or the previous strategy in the chain.
    pub destination: &'a Path,
    /// Per-file metadata view.
    pub metadata: &'a Metadata,
    /// Resolve paths but leave the filesystem untouched.
    pub dry_run: bool,
}

/// What a strategy produced for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Final destination of the file.
    pub destination: PathBuf,
    /// Metadata handed to the next strategy in the chain.
    pub metadata: Metadata,
}

impl TransferOutcome {
    /// Outcome that keeps the request's metadata unchanged.
    #[must_use]
    pub fn unchanged(destination: PathBuf, request: &TransferRequest<'_>) -> Self {
        Self {
            destination,
            metadata: request.metadata.clone(),
        }
    }
}

/// A way of materialising one source file at a destination.
///
/// Implementations must be safe to re-run against the same destination and must never report
/// success for a partially written file.
pub trait TransferStrategy: Send + Sync {
    /// Built-in kind this strategy implements.
    fn kind(&self) -> &'static str;

    /// Materialise `request.source` at (or near) `request.destination`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] when the file could not be materialised.
    fn transfer(&self, request: TransferRequest<'_>) -> TransferResult<TransferOutcome>;
}

pub(crate) fn decode_options<T: DeserializeOwned>(
    name: &str,
    options: &StrategyOptions,
) -> TransferResult<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|source| {
        TransferError::Options {
            name: name.to_string(),
            source,
        }
    })
}

/// Apply an optional file-name template, keeping the proposed parent directory.
pub(crate) fn retarget(
    kind: &'static str,
    renderer: &TemplateRenderer,
    template: Option<&str>,
    request: &TransferRequest<'_>,
) -> PathBuf {
    let Some(template) = template else {
        return request.destination.to_path_buf();
    };
    match renderer.render_relative_path(template, request.metadata) {
        Ok(name) => request
            .destination
            .parent()
            .map_or_else(|| name.clone(), |parent| parent.join(&name)),
        Err(err) => {
            warn!(
                strategy = kind,
                template,
                error = %err.describe(),
                destination = %request.destination.display(),
                "strategy template failed; keeping proposed destination"
            );
            request.destination.to_path_buf()
        }
    }
}

pub(crate) fn ensure_parent(operation: &'static str, destination: &Path) -> TransferResult<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TransferError::io(operation, parent, source))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retarget_keeps_parent_and_falls_back() {
        let renderer = TemplateRenderer::new();
        let mut metadata = Metadata::new();
        metadata.insert("shot".into(), "sh010".into());
        let request = TransferRequest {
            source: Path::new("/src/plate.exr"),
            destination: Path::new("/out/PKG/plates/plate.exr"),
            metadata: &metadata,
            dry_run: true,
        };

        assert_eq!(
            retarget("copy", &renderer, None, &request),
            PathBuf::from("/out/PKG/plates/plate.exr")
        );
        assert_eq!(
            retarget("copy", &renderer, Some("{{ shot }}_plate.exr"), &request),
            PathBuf::from("/out/PKG/plates/sh010_plate.exr")
        );
        assert_eq!(
            retarget("copy", &renderer, Some("{{ missing }}.exr"), &request),
            PathBuf::from("/out/PKG/plates/plate.exr")
        );
        assert_eq!(
            retarget("copy", &renderer, Some("../{{ shot }}.exr"), &request),
            PathBuf::from("/out/PKG/plates/plate.exr")
        );
    }
}
