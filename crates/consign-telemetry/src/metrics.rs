//! Prometheus-backed delivery metrics.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Label values come from fixed sets: strategy kinds, failure kinds, registered callback
//!   names (anything else is counted as `unknown`). Package-supplied text never becomes a label.

use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{CollectorStage, TelemetryError, TelemetryResult};

/// Prometheus registry holding the delivery collectors.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    deliveries_total: IntCounterVec,
    files_total: IntCounterVec,
    item_failures_total: IntCounterVec,
    template_fallbacks_total: IntCounterVec,
    callbacks_total: IntCounterVec,
    last_delivery_duration_ms: IntGauge,
    // Unregistered totals across strategy labels, for snapshots only.
    files_succeeded: IntCounter,
    files_failed: IntCounter,
}

/// Snapshot of the headline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Deliveries where every file succeeded.
    pub deliveries_complete: u64,
    /// Deliveries with at least one failed file.
    pub deliveries_partial: u64,
    /// Files delivered successfully, across strategies.
    pub files_succeeded: u64,
    /// Files that failed, across strategies.
    pub files_failed: u64,
    /// Duration of the latest delivery in milliseconds.
    pub last_delivery_duration_ms: i64,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl Metrics {
    /// Construct a metrics registry with the delivery collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let deliveries_total = counter_vec(
            "consign_deliveries_total",
            "Deliveries finished, by outcome",
            &["outcome"],
        )?;
        let files_total = counter_vec(
            "consign_files_total",
            "Files processed, by kind of the final strategy and status",
            &["kind", "status"],
        )?;
        let item_failures_total = counter_vec(
            "consign_item_failures_total",
            "Failed per-file results, by failure kind",
            &["kind"],
        )?;
        let template_fallbacks_total = counter_vec(
            "consign_template_fallbacks_total",
            "Destination templates that fell back to the original file name",
            &["reason"],
        )?;
        let callbacks_total = counter_vec(
            "consign_callbacks_total",
            "Post-delivery callbacks invoked, by callback and status",
            &["callback", "status"],
        )?;
        let last_delivery_duration_ms = IntGauge::with_opts(Opts::new(
            "consign_last_delivery_duration_ms",
            "Wall-clock duration of the latest delivery (ms)",
        ))
        .map_err(|source| {
            TelemetryError::collector(
                "consign_last_delivery_duration_ms",
                CollectorStage::Build,
                source,
            )
        })?;

        register(&registry, "consign_deliveries_total", &deliveries_total)?;
        register(&registry, "consign_files_total", &files_total)?;
        register(&registry, "consign_item_failures_total", &item_failures_total)?;
        register(
            &registry,
            "consign_template_fallbacks_total",
            &template_fallbacks_total,
        )?;
        register(&registry, "consign_callbacks_total", &callbacks_total)?;
        register(
            &registry,
            "consign_last_delivery_duration_ms",
            &last_delivery_duration_ms,
        )?;

        let files_succeeded = plain_counter("files_succeeded", "Files delivered")?;
        let files_failed = plain_counter("files_failed", "Files failed")?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                deliveries_total,
                files_total,
                item_failures_total,
                template_fallbacks_total,
                callbacks_total,
                last_delivery_duration_ms,
                files_succeeded,
                files_failed,
            }),
        })
    }

    /// Count a finished delivery.
    pub fn inc_delivery(&self, complete: bool) {
        let outcome = if complete { "complete" } else { "partial" };
        self.inner
            .deliveries_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count one processed file under the kind of the strategy that placed it.
    pub fn inc_file(&self, kind: &'static str, success: bool) {
        let status = if success { "succeeded" } else { "failed" };
        self.inner
            .files_total
            .with_label_values(&[kind, status])
            .inc();
        if success {
            self.inner.files_succeeded.inc();
        } else {
            self.inner.files_failed.inc();
        }
    }

    /// Count a failed per-file result by kind (`source_not_found`, `unknown_strategy`, ...).
    pub fn inc_item_failure(&self, kind: &str) {
        self.inner
            .item_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Count a destination template that fell back to the original file name.
    pub fn inc_template_fallback(&self, reason: &str) {
        self.inner
            .template_fallbacks_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Count a callback invocation (`succeeded`, `failed`, `unknown`).
    pub fn inc_callback(&self, callback: &str, status: &str) {
        self.inner
            .callbacks_total
            .with_label_values(&[callback, status])
            .inc();
    }

    /// Record the duration of the latest delivery.
    pub fn observe_delivery_duration(&self, duration: Duration) {
        self.inner
            .last_delivery_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or are not valid UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Exposition { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::ExpositionUtf8 { source })
    }

    /// Take a point-in-time snapshot of the headline counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deliveries_complete: self
                .inner
                .deliveries_total
                .with_label_values(&["complete"])
                .get(),
            deliveries_partial: self
                .inner
                .deliveries_total
                .with_label_values(&["partial"])
                .get(),
            files_succeeded: self.inner.files_succeeded.get(),
            files_failed: self.inner.files_failed.get(),
            last_delivery_duration_ms: self.inner.last_delivery_duration_ms.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(
    name: &'static str,
    help: &'static str,
    labels: &[&str],
) -> TelemetryResult<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::collector(name, CollectorStage::Build, source))
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> TelemetryResult<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::collector(name, CollectorStage::Register, source))
}

fn plain_counter(name: &'static str, help: &'static str) -> TelemetryResult<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::collector(name, CollectorStage::Build, source))
}
