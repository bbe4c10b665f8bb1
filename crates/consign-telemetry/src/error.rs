//! Telemetry errors.
//!
//! Messages are constant; the metric name or setup stage travels as context.

use prometheus::Error as PrometheusError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Stage of collector setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStage {
    /// Building the collector from its options.
    Build,
    /// Adding the collector to the registry.
    Register,
}

impl CollectorStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Register => "register",
        }
    }
}

/// Errors raised while installing logging or operating the metrics registry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed by another component.
    #[error("tracing subscriber installation failed")]
    Subscriber {
        /// Underlying subscriber error.
        source: TryInitError,
    },
    /// A delivery metric could not be set up.
    #[error("metrics collector setup failed")]
    Collector {
        /// Metric name.
        name: &'static str,
        /// Setup stage.
        stage: CollectorStage,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition could not be encoded.
    #[error("metrics exposition failed")]
    Exposition {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The encoder produced bytes that are not UTF-8.
    #[error("metrics exposition was not utf-8")]
    ExpositionUtf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl TelemetryError {
    pub(crate) const fn collector(
        name: &'static str,
        stage: CollectorStage,
        source: PrometheusError,
    ) -> Self {
        Self::Collector {
            name,
            stage,
            source,
        }
    }

    /// Human-readable rendering that includes the context fields.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Subscriber { source } => format!("{self}: {source}"),
            Self::Collector {
                name,
                stage,
                source,
            } => format!("{self} ({} '{name}'): {source}", stage.as_str()),
            Self::Exposition { source } => format!("{self}: {source}"),
            Self::ExpositionUtf8 { source } => format!("{self}: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn collector_errors_name_metric_and_stage() {
        let err = TelemetryError::collector(
            "consign_files_total",
            CollectorStage::Register,
            PrometheusError::AlreadyReg,
        );
        assert_eq!(err.to_string(), "metrics collector setup failed");
        assert!(err.source().is_some());
        assert!(
            err.describe()
                .starts_with("metrics collector setup failed (register 'consign_files_total'): ")
        );
    }

    #[test]
    fn utf8_failures_keep_their_source() {
        if let Err(source) = String::from_utf8(vec![0, 159]) {
            let err = TelemetryError::ExpositionUtf8 { source };
            assert_eq!(err.to_string(), "metrics exposition was not utf-8");
            assert!(err.source().is_some());
        }
    }
}
