//! Input contract: the package description handed to the engine.
//!
//! # Design
//! - Metadata is a flat, ordered string map; connectors may send numbers or booleans and the
//!   decoder stores their string form.
//! - `process_method` is either one strategy name or an ordered chain of names.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// Strategy used when an item does not name one.
pub const DEFAULT_PROCESS_METHOD: &str = "copy";

/// Flat metadata mapping used by templates and strategies.
pub type Metadata = BTreeMap<String, String>;

/// Free-form configuration block attached to a callback name.
pub type CallbackConfig = serde_json::Map<String, Value>;

/// One logical unit of delivery (a shot, an asset, a sequence folder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageItem {
    /// Source file or directory.
    pub source_path: PathBuf,
    /// Destination path template, relative to the delivery folder.
    pub target_template: String,
    /// Strategy name or chain used to materialise each file.
    #[serde(default)]
    pub process_method: ProcessMethod,
    /// Metadata available to templates and strategies.
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: Metadata,
}

impl PackageItem {
    /// Build an item that uses the default strategy and no metadata.
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, target_template: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_template: target_template.into(),
            process_method: ProcessMethod::default(),
            metadata: Metadata::new(),
        }
    }

    /// Replace the strategy chain.
    #[must_use]
    pub fn with_process_method(mut self, process_method: ProcessMethod) -> Self {
        self.process_method = process_method;
        self
    }

    /// Insert one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Description shown in manifests, read from the `description` metadata key.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.metadata
            .get("description")
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Ordered list of strategy names applied to every file of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMethod(Vec<String>);

impl ProcessMethod {
    /// Single-strategy method.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Chain of strategies executed in order on the same file.
    #[must_use]
    pub fn chain<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Strategy names in execution order.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.0
    }

    /// Whether the chain names no strategy at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact label used in logs and metrics.
    #[must_use]
    pub fn label(&self) -> String {
        self.0.join("+")
    }
}

impl Default for ProcessMethod {
    fn default() -> Self {
        Self::single(DEFAULT_PROCESS_METHOD)
    }
}

impl Serialize for ProcessMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let [only] = self.0.as_slice() {
            return serializer.serialize_str(only);
        }
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for name in &self.0 {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ProcessMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(name) => Self::single(name),
            Repr::Many(names) => Self(names),
        })
    }
}

/// The package description consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPackage {
    /// Name of the delivery folder created under the delivery root.
    pub package_name: String,
    /// Identifier for client-specific settings.
    pub client_config: String,
    /// Items delivered in order.
    pub items: Vec<PackageItem>,
    /// Callback names mapped to their configuration.
    #[serde(default)]
    pub callbacks: BTreeMap<String, CallbackConfig>,
    /// Override for the configured delivery root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_root: Option<PathBuf>,
    /// Compute outcomes without touching the filesystem.
    #[serde(default)]
    pub dry_run: bool,
}

impl DeliveryPackage {
    /// Decode a package description from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] when the document is not a valid package description.
    pub fn from_json(text: &str) -> ModelResult<Self> {
        serde_json::from_str(text).map_err(|source| ModelError::Parse {
            document: "package",
            source,
        })
    }

    /// Check the invariants of the input contract.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPackage`] describing the first violation.
    pub fn validate(&self) -> ModelResult<()> {
        validate_package_name(&self.package_name)?;
        if self.client_config.trim().is_empty() {
            return Err(ModelError::invalid("client_config", "empty", None));
        }
        if self.items.is_empty() {
            return Err(ModelError::invalid("items", "empty", None));
        }
        for item in &self.items {
            if item.source_path.as_os_str().is_empty() {
                return Err(ModelError::invalid("items.source_path", "empty", None));
            }
            if item.process_method.is_empty() {
                return Err(ModelError::invalid(
                    "items.process_method",
                    "empty",
                    Some(&item.source_path.to_string_lossy()),
                ));
            }
            if item
                .process_method
                .steps()
                .iter()
                .any(|name| name.trim().is_empty())
            {
                return Err(ModelError::invalid(
                    "items.process_method",
                    "blank_name",
                    Some(&item.source_path.to_string_lossy()),
                ));
            }
        }
        Ok(())
    }

    /// Delivery folder for this package: the override root (or `default_root`) joined with the
    /// package name.
    #[must_use]
    pub fn delivery_path(&self, default_root: &Path) -> PathBuf {
        self.destination_root
            .as_deref()
            .unwrap_or(default_root)
            .join(&self.package_name)
    }
}

/// Ensure a package name maps to exactly one directory below the delivery root.
///
/// # Errors
///
/// Returns [`ModelError::InvalidPackage`] when the name is empty, contains separators or NUL
/// bytes, or is a relative directory marker.
pub fn validate_package_name(name: &str) -> ModelResult<()> {
    if name.trim().is_empty() {
        return Err(ModelError::invalid("package_name", "empty", None));
    }
    if name.contains(['/', '\\']) {
        return Err(ModelError::invalid("package_name", "path_separator", Some(name)));
    }
    if name.contains('\0') {
        return Err(ModelError::invalid("package_name", "nul_byte", Some(name)));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ModelError::invalid("package_name", "not_a_folder_name", Some(name))),
    }
}

fn deserialize_metadata<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    let mut metadata = Metadata::new();
    for (key, value) in raw {
        match value {
            Value::Null => {}
            Value::String(text) => {
                metadata.insert(key, text);
            }
            Value::Bool(flag) => {
                metadata.insert(key, flag.to_string());
            }
            Value::Number(number) => {
                metadata.insert(key, number.to_string());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(serde::de::Error::custom(format!(
                    "metadata value for '{key}' must be a string, number or boolean"
                )));
            }
        }
    }
    Ok(metadata)
}
