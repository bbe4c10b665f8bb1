//! Writes the Markdown manifest into the delivery folder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use consign_model::{CallbackConfig, DeliveryResult};
use consign_template::{DEFAULT_MANIFEST_TEMPLATE, ManifestContext, render_manifest};
use tracing::info;

use super::{CallbackError, CallbackResult, DeliveryCallback, option_str};

const NAME: &str = "manifest";

/// Renders `manifest.md` at the result's manifest path.
///
/// Options: `template_name` (defaults to the built-in `manifest.md.j2`) and `template_dir`
/// (overrides the directory given at construction).
#[derive(Debug, Clone, Default)]
pub struct ManifestCallback {
    template_dir: Option<PathBuf>,
}

impl ManifestCallback {
    /// Callback that loads templates from `template_dir` when set.
    #[must_use]
    pub const fn new(template_dir: Option<PathBuf>) -> Self {
        Self { template_dir }
    }
}

#[async_trait]
impl DeliveryCallback for ManifestCallback {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn invoke(
        &self,
        result: &DeliveryResult,
        config: &CallbackConfig,
        dry_run: bool,
    ) -> CallbackResult<()> {
        let template_name =
            option_str(config, "template_name").unwrap_or(DEFAULT_MANIFEST_TEMPLATE);
        let template_dir = option_str(config, "template_dir")
            .map(PathBuf::from)
            .or_else(|| self.template_dir.clone());
        let target = PathBuf::from(&result.manifest_path);

        let context = ManifestContext::from_result(result);
        let body = render_manifest(template_name, template_dir.as_deref(), &context).map_err(
            |source| CallbackError::Template {
                callback: NAME,
                source,
            },
        )?;

        if dry_run {
            info!(
                path = %target.display(),
                template = template_name,
                bytes = body.len(),
                "dry run: manifest not written"
            );
            return Ok(());
        }

        write_manifest(&target, &body).await?;
        info!(path = %target.display(), "manifest written");
        Ok(())
    }
}

async fn write_manifest(target: &Path, body: &str) -> CallbackResult<()> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CallbackError::Io {
            callback: NAME,
            path,
            source,
        }
    };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io(parent))?;
    }
    tokio::fs::write(target, body).await.map_err(io(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_model::ItemResult;
    use serde_json::json;

    fn result_in(dir: &Path) -> DeliveryResult {
        let delivery = dir.join("PKG");
        let dest = |name: &str| delivery.join(name).display().to_string();
        let results = vec![
            ItemResult::succeeded("/src/a.1001.exr", dest("a.1001.exr"), None),
            ItemResult::succeeded("/src/a.1002.exr", dest("a.1002.exr"), None),
            ItemResult::failed("/src/missing.mov", "", None, "source not found"),
        ];
        DeliveryResult {
            package_name: "PKG".into(),
            delivery_path: delivery.display().to_string(),
            manifest_path: delivery.join("manifest.md").display().to_string(),
            timestamp: "2024-05-01 10:00:00".into(),
            summary: consign_model::summarize(&results),
            results,
        }
    }

    #[tokio::test]
    async fn writes_builtin_manifest() -> Result<()> {
        let dir = tempfile::Builder::new().prefix("consign-manifest-").tempdir()?;
        let result = result_in(dir.path());

        ManifestCallback::default()
            .invoke(&result, &CallbackConfig::new(), false)
            .await?;

        let body = std::fs::read_to_string(&result.manifest_path)?;
        assert!(body.contains("PKG"));
        assert!(body.contains("a.[1001-1002].exr"));
        assert!(body.contains("source not found"));
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_leaves_no_file() -> Result<()> {
        let dir = tempfile::Builder::new().prefix("consign-manifest-").tempdir()?;
        let result = result_in(dir.path());

        ManifestCallback::default()
            .invoke(&result, &CallbackConfig::new(), true)
            .await?;

        assert!(!Path::new(&result.manifest_path).exists());
        Ok(())
    }

    #[tokio::test]
    async fn custom_template_dir_from_options() -> Result<()> {
        let dir = tempfile::Builder::new().prefix("consign-manifest-").tempdir()?;
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates)?;
        std::fs::write(
            templates.join("short.j2"),
            "{{ package_name }}: {{ succeeded }}/{{ total }}\n",
        )?;
        let result = result_in(dir.path());
        let config = json!({
            "template_name": "short.j2",
            "template_dir": templates.display().to_string(),
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        ManifestCallback::default()
            .invoke(&result, &config, false)
            .await?;

        let body = std::fs::read_to_string(&result.manifest_path)?;
        assert_eq!(body.trim_end(), "PKG: 2/3");
        Ok(())
    }

    #[tokio::test]
    async fn missing_template_is_reported() -> Result<()> {
        let dir = tempfile::Builder::new().prefix("consign-manifest-").tempdir()?;
        let result = result_in(dir.path());
        let callback = ManifestCallback::new(Some(dir.path().to_path_buf()));

        let err = callback
            .invoke(&result, &CallbackConfig::new(), false)
            .await
            .err();
        assert!(matches!(err, Some(CallbackError::Template { .. })));
        assert!(!Path::new(&result.manifest_path).exists());
        Ok(())
    }
}
