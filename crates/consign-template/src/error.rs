//! # Design
//!
//! - Constant messages; the template text or name travels as context.
//! - The engine treats every variant as recoverable (it falls back to the original file name).

use thiserror::Error;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A path template failed to parse or referenced an unknown key.
    #[error("template render failure")]
    Render {
        /// Template source that failed.
        template: String,
        /// Underlying template engine error.
        source: minijinja::Error,
    },
    /// A rendered path left the delivery folder or rendered to nothing.
    #[error("rendered path rejected")]
    UnsafePath {
        /// Rendered value.
        rendered: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// A manifest template could not be loaded or rendered.
    #[error("manifest render failure")]
    Manifest {
        /// Template name looked up in the template directory.
        template_name: String,
        /// Underlying template engine error.
        source: minijinja::Error,
    },
}

impl TemplateError {
    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Render { template, source } => format!("{self} in '{template}': {source}"),
            Self::UnsafePath { rendered, reason } => format!("{self} ({reason}): '{rendered}'"),
            Self::Manifest {
                template_name,
                source,
            } => format!("{self} in '{template_name}': {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_rendered_value() {
        let err = TemplateError::UnsafePath {
            rendered: "../x".into(),
            reason: "parent_segment",
        };
        assert_eq!(
            err.describe(),
            "rendered path rejected (parent_segment): '../x'"
        );
    }
}
