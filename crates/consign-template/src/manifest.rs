//! Delivery manifest rendering.
//!
//! # Design
//! - Manifests use a Jinja environment with trimmed blocks and no auto-escaping (Markdown output).
//! - With a template directory, templates load from that directory only; without one the built-in
//!   `manifest.md.j2` is used.
//! - The context carries grouped [`DisplayEntry`] rows, never raw per-file results.
//! - A `cell` filter keeps pipes and newlines in names and errors from breaking table rows.

use std::path::Path;

use consign_model::DeliveryResult;
use minijinja::{AutoEscape, Environment, path_loader};
use serde::Serialize;

use crate::error::{TemplateError, TemplateResult};
use crate::render::register_path_filters;
use crate::sequence::{DisplayEntry, group_sequences};

/// Template name used when a caller does not pick one.
pub const DEFAULT_MANIFEST_TEMPLATE: &str = "manifest.md.j2";

const BUILTIN_MANIFEST: &str = include_str!("../templates/manifest.md.j2");

/// Values exposed to manifest templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestContext {
    /// Package that was delivered.
    pub package_name: String,
    /// Delivery start time.
    pub timestamp: String,
    /// Delivery folder.
    pub delivery_path: String,
    /// Human-readable summary line.
    pub summary: String,
    /// Successfully delivered files.
    pub succeeded: usize,
    /// Resolved files.
    pub total: usize,
    /// Grouped display rows.
    pub results: Vec<DisplayEntry>,
}

impl ManifestContext {
    /// Build the context for a finished delivery, grouping frame sequences.
    #[must_use]
    pub fn from_result(result: &DeliveryResult) -> Self {
        Self {
            package_name: result.package_name.clone(),
            timestamp: result.timestamp.clone(),
            delivery_path: result.delivery_path.clone(),
            summary: result.summary.clone(),
            succeeded: result.succeeded_count(),
            total: result.results.len(),
            results: group_sequences(&result.results),
        }
    }
}

/// Render a manifest template.
///
/// # Errors
///
/// Returns [`TemplateError::Manifest`] when the template cannot be found, parsed or rendered.
pub fn render_manifest(
    template_name: &str,
    template_dir: Option<&Path>,
    context: &ManifestContext,
) -> TemplateResult<String> {
    let wrap = |source: minijinja::Error| TemplateError::Manifest {
        template_name: template_name.to_string(),
        source,
    };

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    register_path_filters(&mut env);
    env.add_filter("cell", table_cell);

    match template_dir {
        Some(dir) => env.set_loader(path_loader(dir)),
        None => env
            .add_template(DEFAULT_MANIFEST_TEMPLATE, BUILTIN_MANIFEST)
            .map_err(wrap)?,
    }

    let template = env.get_template(template_name).map_err(wrap)?;
    template.render(context).map_err(wrap)
}

// Markdown table cell: pipes would split the row and newlines would end it.
fn table_cell(value: String) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_model::{ItemResult, summarize};
    use std::fs;

    fn sample_result() -> DeliveryResult {
        let mut results = vec![
            ItemResult::succeeded("/src/shot.1001.exr", "/out/PKG/sh010/shot.1001.exr", None),
            ItemResult::succeeded("/src/shot.1002.exr", "/out/PKG/sh010/shot.1002.exr", None),
            ItemResult::succeeded("/src/notes.txt", "/out/PKG/notes.txt", None),
            ItemResult::failed("/src/missing.mov", "", None, "source not found"),
        ];
        results[0].description = Some("Final comp".into());
        DeliveryResult {
            package_name: "PKG".into(),
            delivery_path: "/out/PKG".into(),
            manifest_path: "/out/PKG/manifest.md".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            summary: summarize(&results),
            results,
        }
    }

    #[test]
    fn context_groups_results() {
        let context = ManifestContext::from_result(&sample_result());
        assert_eq!(context.total, 4);
        assert_eq!(context.succeeded, 3);
        assert_eq!(context.results.len(), 3);
        assert_eq!(context.results[0].destination, "shot.[1001-1002].exr");
    }

    #[test]
    fn builtin_template_renders_markdown() -> Result<()> {
        let context = ManifestContext::from_result(&sample_result());
        let text = render_manifest(DEFAULT_MANIFEST_TEMPLATE, None, &context)?;
        assert!(text.contains("# Delivery Manifest: PKG"));
        assert!(text.contains("Delivered 3 of 4 files."));
        assert!(text.contains("| OK | `shot.[1001-1002].exr` | Final comp |"));
        assert!(text.contains("| OK | `notes.txt` |"));
        assert!(text.contains("| FAILED | `/src/missing.mov` |  (source not found) |"));
        Ok(())
    }

    #[test]
    fn pipes_and_newlines_stay_inside_table_cells() -> Result<()> {
        let results = vec![
            ItemResult::succeeded("/src/a|b.txt", "/out/PKG/a|b.txt", Some("left|right".into())),
            ItemResult::failed("/src/c.txt", "", None, "copy failed:\nno|space"),
        ];
        let result = DeliveryResult {
            package_name: "PKG".into(),
            delivery_path: "/out/PKG".into(),
            manifest_path: "/out/PKG/manifest.md".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            summary: summarize(&results),
            results,
        };
        let context = ManifestContext::from_result(&result);
        let text = render_manifest(DEFAULT_MANIFEST_TEMPLATE, None, &context)?;
        assert!(text.contains(r"| OK | `a\|b.txt` | left\|right |"));
        assert!(text.contains(r"| FAILED | `/src/c.txt` |  (copy failed: no\|space) |"));
        Ok(())
    }

    #[test]
    fn custom_template_directory_is_used() -> Result<()> {
        let dir = tempfile::Builder::new()
            .prefix("consign-manifest-")
            .tempdir()?;
        fs::write(
            dir.path().join("short.txt.j2"),
            "{{ package_name }}: {{ results | length }} rows, {{ summary }}",
        )?;
        let context = ManifestContext::from_result(&sample_result());
        let text = render_manifest("short.txt.j2", Some(dir.path()), &context)?;
        assert_eq!(text, "PKG: 3 rows, Delivered 3 of 4 files.");
        Ok(())
    }

    #[test]
    fn missing_template_is_an_error() -> Result<()> {
        let dir = tempfile::Builder::new()
            .prefix("consign-manifest-")
            .tempdir()?;
        let context = ManifestContext::from_result(&sample_result());
        let err = render_manifest("absent.j2", Some(dir.path()), &context).unwrap_err();
        assert!(matches!(err, TemplateError::Manifest { .. }));
        let err = render_manifest("absent.j2", None, &context).unwrap_err();
        assert!(matches!(err, TemplateError::Manifest { .. }));
        Ok(())
    }
}
