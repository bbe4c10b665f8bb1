//! Settings validation.

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LOG_FORMATS, Settings};

impl Settings {
    /// Check the settings for values that can never work.
    ///
    /// Strategy kinds are checked later, when the strategy registry is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first invalid value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::invalid("storage", "root", None, "empty"));
        }
        if self
            .paths
            .template_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::invalid("paths", "template_dir", None, "empty"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging", "level", None, "empty"));
        }
        if let Some(format) = self.logging.format.as_deref()
            && !LOG_FORMATS.contains(&format)
        {
            return Err(ConfigError::invalid(
                "logging",
                "format",
                Some(format.to_string()),
                "unknown_format",
            ));
        }
        for (name, strategy) in &self.strategies {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid("strategies", "name", None, "empty"));
            }
            if strategy.kind.as_deref().is_some_and(|kind| kind.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    "strategies",
                    name.clone(),
                    None,
                    "empty_kind",
                ));
            }
        }
        if self.callbacks.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::invalid("callbacks", "name", None, "empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StrategySettings;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn invalid_values_are_reported_with_context() {
        let mut settings = Settings::default();
        settings.logging.format = Some("xml".into());
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                section: "logging",
                reason: "unknown_format",
                ..
            }
        ));
        assert!(err.describe().contains("'xml'"));

        let mut settings = Settings::default();
        settings.storage.root = PathBuf::new();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.strategies.insert(
            "broken".into(),
            StrategySettings {
                kind: Some(" ".into()),
                ..StrategySettings::default()
            },
        );
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField { ref field, .. } if field == "broken"
        ));
    }
}
