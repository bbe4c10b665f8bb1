//! Settings loading from YAML files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Where a settings document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOrigin {
    /// No file was requested.
    Defaults,
    /// The requested file does not exist; defaults apply.
    MissingFile(PathBuf),
    /// Parsed from this file.
    File(PathBuf),
}

impl SettingsOrigin {
    /// Emit the log line describing this origin.
    pub fn log(&self) {
        match self {
            Self::Defaults => debug!("no settings file given; using defaults"),
            Self::MissingFile(path) => {
                warn!(path = %path.display(), "settings file not found; using defaults");
            }
            Self::File(path) => info!(path = %path.display(), "settings loaded"),
        }
    }
}

impl Settings {
    /// Parse a settings document.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] when the text does not match the settings schema.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml { path: None, source })
    }

    /// Load settings from `path`, falling back to the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file exists but cannot be read and
    /// [`ConfigError::Yaml`] when it is malformed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let (settings, origin) = Self::load_with_origin(Some(path))?;
        origin.log();
        Ok(settings)
    }

    /// Load settings from `path` when given, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn load_optional(path: Option<&Path>) -> ConfigResult<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Like [`Settings::load_optional`], but reports where the settings came from instead of
    /// logging it, for callers that install logging only after settings are known.
    ///
    /// # Errors
    ///
    /// See [`Settings::load`].
    pub fn load_with_origin(path: Option<&Path>) -> ConfigResult<(Self, SettingsOrigin)> {
        let Some(path) = path else {
            return Ok((Self::default(), SettingsOrigin::Defaults));
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok((
                    Self::default(),
                    SettingsOrigin::MissingFile(path.to_path_buf()),
                ));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let settings = Self::from_yaml_str(&text).map_err(|err| match err {
            ConfigError::Yaml { source, .. } => ConfigError::Yaml {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })?;
        Ok((settings, SettingsOrigin::File(path.to_path_buf())))
    }

    /// Replace the delivery root.
    #[must_use]
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage.root = root.into();
        self
    }
}
