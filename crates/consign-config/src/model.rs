//! Typed settings document.
//!
//! ```yaml
//! storage:
//!   root: /mnt/deliveries
//! paths:
//!   template_dir: /etc/consign/templates
//! logging:
//!   level: info
//!   format: json
//! strategies:
//!   shot_tokens:
//!     kind: tokenize
//!     delimiter: "/"
//!     tokens: { show: 2, shot: -2 }
//! callbacks:
//!   mattermost:
//!     webhook_url: https://chat.example.com/hooks/abc
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use consign_model::CallbackConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delivery root used when neither settings nor the package name one.
pub const DEFAULT_STORAGE_ROOT: &str = "/tmp/consign_deliveries";
/// Log level used when settings do not name one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Accepted values for `logging.format`.
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Root settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where deliveries land.
    pub storage: StorageSettings,
    /// Auxiliary file locations.
    pub paths: PathSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Named strategy instances.
    pub strategies: BTreeMap<String, StrategySettings>,
    /// Default configuration per callback name, merged under package callback configuration.
    pub callbacks: BTreeMap<String, CallbackConfig>,
}

/// Storage section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Default delivery root.
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }
}

/// Paths section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding manifest templates; the built-in template is used when unset.
    pub template_dir: Option<PathBuf>,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`; inferred from the build profile when unset.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// One named strategy instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    /// Built-in kind; defaults to the instance name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Kind-specific options.
    #[serde(flatten)]
    pub options: serde_json::Map<String, Value>,
}

impl StrategySettings {
    /// Kind backing the instance called `name`.
    #[must_use]
    pub fn kind_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.kind.as_deref().unwrap_or(name)
    }
}
