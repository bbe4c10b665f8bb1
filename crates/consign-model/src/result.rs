//! Output contract: per-file outcomes and the delivery result record.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Outcome of delivering one resolved file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    /// Source file (or configured item path when the item failed before resolution).
    pub source: String,
    /// Final destination, empty when the item never reached a destination.
    pub destination: String,
    /// Optional human-readable description carried into manifests.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the file was delivered.
    pub success: bool,
    /// Failure detail; present exactly when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl ItemResult {
    /// Successful outcome.
    #[must_use]
    pub fn succeeded(
        source: impl Into<String>,
        destination: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            description,
            success: true,
            error: None,
        }
    }

    /// Failed outcome with its error detail.
    #[must_use]
    pub fn failed(
        source: impl Into<String>,
        destination: impl Into<String>,
        description: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            description,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result record emitted once per delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Package that was delivered.
    pub package_name: String,
    /// Delivery folder.
    pub delivery_path: String,
    /// Location of the rendered manifest inside the delivery folder.
    pub manifest_path: String,
    /// Local wall-clock time the delivery started, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    /// One entry per resolved file, in processing order.
    pub results: Vec<ItemResult>,
    /// Human-readable success count.
    pub summary: String,
}

impl DeliveryResult {
    /// Number of successfully delivered files.
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|result| result.success).count()
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    /// True when no resolved file failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|result| result.success)
    }

    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Encode`] if serialization fails.
    pub fn to_json_pretty(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| ModelError::Encode {
            document: "result",
            source,
        })
    }

    /// Decode a previously emitted result record.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] when the document is not a result record.
    pub fn from_json(text: &str) -> ModelResult<Self> {
        serde_json::from_str(text).map_err(|source| ModelError::Parse {
            document: "result",
            source,
        })
    }
}

/// Summary line for a list of per-file outcomes.
#[must_use]
pub fn summarize(results: &[ItemResult]) -> String {
    let succeeded = results.iter().filter(|result| result.success).count();
    format!("Delivered {succeeded} of {} files.", results.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample_result() -> DeliveryResult {
        let results = vec![
            ItemResult::succeeded(
                "/src/sh010.1001.exr",
                "/out/PKG/sh010/sh010.1001.exr",
                Some("Final comp".into()),
            ),
            ItemResult::failed("/src/missing", "", None, "source not found"),
        ];
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
    fn constructors_keep_error_and_success_consistent() {
        let ok = ItemResult::succeeded("a", "b", None);
        assert!(ok.success && ok.error.is_none());
        let failed = ItemResult::failed("a", "", None, "boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn summary_counts_successes_over_total() {
        assert_eq!(summarize(&[]), "Delivered 0 of 0 files.");
        let result = sample_result();
        assert_eq!(result.summary, "Delivered 1 of 2 files.");
        assert_eq!(result.succeeded_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.is_complete());
    }

    #[test]
    fn result_round_trips_through_json() -> Result<()> {
        let result = sample_result();
        let text = result.to_json_pretty()?;
        let decoded = DeliveryResult::from_json(&text)?;
        assert_eq!(decoded, result);
        Ok(())
    }
}
