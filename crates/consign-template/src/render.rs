//! Path templates rendered against per-file metadata.
//!
//! # Design
//! - Jinja syntax (`{{ shot }}_v{{ version }}.{{ file_ext }}`) with strict undefined handling so a
//!   missing key is an error rather than an empty string.
//! - Path helpers are exposed as filters: `basename`, `dirname`, `stem`, `splitext`, `extension`.
//! - Rendering never touches the filesystem.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use consign_model::Metadata;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::error::{TemplateError, TemplateResult};

static SHARED: OnceLock<TemplateRenderer> = OnceLock::new();

/// Renders path templates with the path helper filters installed.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Build a renderer with strict undefined handling.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        register_path_filters(&mut env);
        Self { env }
    }

    /// Render `template` with `metadata` as the context.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] on syntax errors or references to absent keys.
    pub fn render(&self, template: &str, metadata: &Metadata) -> TemplateResult<String> {
        self.env
            .render_str(template, metadata)
            .map_err(|source| TemplateError::Render {
                template: template.to_string(),
                source,
            })
    }

    /// Render `template` and check that the output is a relative path that stays inside the
    /// folder it will be joined to.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Render`] when rendering fails and [`TemplateError::UnsafePath`]
    /// when the output is empty, absolute or climbs out with `..`.
    pub fn render_relative_path(
        &self,
        template: &str,
        metadata: &Metadata,
    ) -> TemplateResult<PathBuf> {
        let rendered = self.render(template, metadata)?;
        sanitize_relative_path(rendered.trim())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render `template` with a process-wide renderer.
///
/// # Errors
///
/// See [`TemplateRenderer::render`].
pub fn render(template: &str, metadata: &Metadata) -> TemplateResult<String> {
    SHARED
        .get_or_init(TemplateRenderer::new)
        .render(template, metadata)
}

pub(crate) fn register_path_filters(env: &mut Environment<'static>) {
    env.add_filter("basename", basename);
    env.add_filter("dirname", dirname);
    env.add_filter("stem", stem);
    env.add_filter("splitext", splitext);
    env.add_filter("extension", extension);
}

fn basename(value: String) -> String {
    Path::new(&value)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn dirname(value: String) -> String {
    Path::new(&value)
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn stem(value: String) -> String {
    Path::new(&value)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Split index of the final extension: the last `.` of the last path segment, ignoring leading
// dots of that segment. Both `/` and `.` are ASCII, so the index is always a char boundary.
fn extension_start(value: &str) -> Option<usize> {
    let segment_start = value.rfind('/').map_or(0, |slash| slash + 1);
    let segment = &value[segment_start..];
    let dot = segment.rfind('.')?;
    segment[..dot]
        .bytes()
        .any(|byte| byte != b'.')
        .then_some(segment_start + dot)
}

// Path with the final extension removed, directory kept.
fn splitext(value: String) -> String {
    match extension_start(&value) {
        Some(cut) => value[..cut].to_string(),
        None => value,
    }
}

// Extension including the leading dot, empty when there is none.
fn extension(value: String) -> String {
    extension_start(&value)
        .map(|cut| value[cut..].to_string())
        .unwrap_or_default()
}

fn sanitize_relative_path(rendered: &str) -> TemplateResult<PathBuf> {
    if rendered.is_empty() {
        return Err(TemplateError::UnsafePath {
            rendered: rendered.to_string(),
            reason: "empty",
        });
    }

    let mut sanitized = PathBuf::new();
    for component in Path::new(rendered).components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(TemplateError::UnsafePath {
                    rendered: rendered.to_string(),
                    reason: "parent_segment",
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(TemplateError::UnsafePath {
                    rendered: rendered.to_string(),
                    reason: "absolute",
                });
            }
        }
    }

    if sanitized.as_os_str().is_empty() {
        return Err(TemplateError::UnsafePath {
            rendered: rendered.to_string(),
            reason: "empty",
        });
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_variables_and_literals() -> Result<()> {
        let renderer = TemplateRenderer::new();
        let meta = metadata(&[("shot", "sh010"), ("version", "003"), ("file_ext", "exr")]);
        let out = renderer.render("{{ shot }}/{{ shot }}_v{{ version }}.{{ file_ext }}", &meta)?;
        assert_eq!(out, "sh010/sh010_v003.exr");
        Ok(())
    }

    #[test]
    fn rendering_is_deterministic() -> Result<()> {
        let meta = metadata(&[("a", "1"), ("b", "two"), ("c", "/x/y.z")]);
        let template = "{{ a }}-{{ b }}-{{ c | stem }}";
        let first = render(template, &meta)?;
        for _ in 0..10 {
            assert_eq!(render(template, &meta)?, first);
        }
        Ok(())
    }

    #[test]
    fn path_filters_match_path_semantics() -> Result<()> {
        let renderer = TemplateRenderer::new();
        let meta = metadata(&[("src", "/shows/abc/plates/sh010.1001.exr")]);
        let cases = [
            ("{{ src | basename }}", "sh010.1001.exr"),
            ("{{ src | dirname }}", "/shows/abc/plates"),
            ("{{ src | stem }}", "sh010.1001"),
            ("{{ src | splitext }}", "/shows/abc/plates/sh010.1001"),
            ("{{ src | extension }}", ".exr"),
            ("{{ src | basename | stem }}", "sh010.1001"),
        ];
        for (template, expected) in cases {
            assert_eq!(renderer.render(template, &meta)?, expected, "{template}");
        }

        let bare = metadata(&[("src", "README")]);
        assert_eq!(renderer.render("{{ src | extension }}", &bare)?, "");
        assert_eq!(renderer.render("{{ src | splitext }}", &bare)?, "README");
        Ok(())
    }

    #[test]
    fn extension_filters_only_look_at_the_last_segment() -> Result<()> {
        let renderer = TemplateRenderer::new();
        let cases = [
            ("a.ü//", "a.ü//", ""),
            ("shot.tar//", "shot.tar//", ""),
            ("x.tar/", "x.tar/", ""),
            ("plates/shot.ü", "plates/shot", ".ü"),
            ("dir.v2/readme", "dir.v2/readme", ""),
            ("conf/.bashrc", "conf/.bashrc", ""),
            ("archive.tar.gz", "archive.tar", ".gz"),
        ];
        for (value, root, ext) in cases {
            let meta = metadata(&[("p", value)]);
            assert_eq!(renderer.render("{{ p | splitext }}", &meta)?, root, "{value}");
            assert_eq!(renderer.render("{{ p | extension }}", &meta)?, ext, "{value}");
        }
        Ok(())
    }

    #[test]
    fn missing_keys_and_bad_syntax_fail() {
        let renderer = TemplateRenderer::new();
        let meta = metadata(&[("shot", "sh010")]);
        assert!(matches!(
            renderer.render("{{ sequence }}_{{ shot }}", &meta),
            Err(TemplateError::Render { .. })
        ));
        assert!(matches!(
            renderer.render("{{ shot ", &meta),
            Err(TemplateError::Render { .. })
        ));
    }

    #[test]
    fn relative_paths_are_sanitized() -> Result<()> {
        let renderer = TemplateRenderer::new();
        let meta = metadata(&[("shot", "sh010"), ("up", ".."), ("root", "/etc")]);
        assert_eq!(
            renderer.render_relative_path("./{{ shot }}/plate.exr", &meta)?,
            PathBuf::from("sh010/plate.exr")
        );
        for template in ["{{ up }}/x", "{{ root }}/passwd", "   ", "."] {
            assert!(
                matches!(
                    renderer.render_relative_path(template, &meta),
                    Err(TemplateError::UnsafePath { .. })
                ),
                "accepted {template}"
            );
        }
        Ok(())
    }
}
