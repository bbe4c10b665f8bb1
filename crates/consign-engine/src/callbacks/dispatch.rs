use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use consign_model::{CallbackConfig, DeliveryResult};
use consign_telemetry::Metrics;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{
    CallbackError, DeliveryCallback, GristUpdateCallback, ManifestCallback, MattermostCallback,
};

/// Metric label for requested callbacks that are not registered.
const UNKNOWN_CALLBACK: &str = "unknown";

/// Name-keyed set of callbacks.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: BTreeMap<String, Arc<dyn DeliveryCallback>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CallbackRegistry {
    /// Registry with no callbacks.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with `manifest`, `mattermost` and `grist_update`.
    ///
    /// `template_dir` is the default manifest template directory; `client` is shared by the HTTP
    /// callbacks.
    #[must_use]
    pub fn with_builtins(template_dir: Option<PathBuf>, client: reqwest::Client) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ManifestCallback::new(template_dir)));
        registry.register(Arc::new(MattermostCallback::new(client.clone())));
        registry.register(Arc::new(GristUpdateCallback::new(client)));
        registry
    }

    /// Add or replace a callback under its own name.
    pub fn register(&mut self, callback: Arc<dyn DeliveryCallback>) {
        self.callbacks.insert(callback.name().to_string(), callback);
    }

    /// Look up a callback.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn DeliveryCallback>> {
        self.callbacks.get(name).cloned()
    }

    /// Registered names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.callbacks.keys().map(String::as_str).collect()
    }
}

/// Outcome of one callback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackReport {
    /// Callback name as requested by the package.
    pub name: String,
    /// Whether the callback completed.
    pub success: bool,
    /// Failure detail.
    pub error: Option<String>,
}

/// Overlay `config` on `defaults`; keys in `config` win.
#[must_use]
pub fn merge_config(defaults: Option<&CallbackConfig>, config: &CallbackConfig) -> CallbackConfig {
    let mut merged = defaults.cloned().unwrap_or_default();
    for (key, value) in config {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Runs the callbacks a package asks for, after the result is final.
#[derive(Debug, Clone)]
pub struct CallbackDispatcher {
    registry: CallbackRegistry,
    defaults: BTreeMap<String, CallbackConfig>,
    metrics: Metrics,
}

impl CallbackDispatcher {
    /// Dispatcher over `registry` with per-callback default configuration from settings.
    #[must_use]
    pub const fn new(
        registry: CallbackRegistry,
        defaults: BTreeMap<String, CallbackConfig>,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            defaults,
            metrics,
        }
    }

    /// Registered callbacks.
    #[must_use]
    pub const fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Invoke every requested callback in name order.
    ///
    /// Failures are logged and reported; they never abort the remaining callbacks.
    pub async fn dispatch(
        &self,
        result: &DeliveryResult,
        requested: &BTreeMap<String, CallbackConfig>,
        dry_run: bool,
    ) -> Vec<CallbackReport> {
        let mut reports = Vec::with_capacity(requested.len());
        for (name, config) in requested {
            let outcome = match self.registry.get(name) {
                Some(callback) => {
                    let merged = merge_config(self.defaults.get(name), config);
                    info!(callback = %name, dry_run, "running callback");
                    callback.invoke(result, &merged, dry_run).await
                }
                None => Err(CallbackError::Unknown { name: name.clone() }),
            };

            let report = match outcome {
                Ok(()) => {
                    self.metrics.inc_callback(name, "succeeded");
                    CallbackReport {
                        name: name.clone(),
                        success: true,
                        error: None,
                    }
                }
                Err(err) => {
                    let detail = err.describe();
                    if matches!(err, CallbackError::Unknown { .. }) {
                        self.metrics.inc_callback(UNKNOWN_CALLBACK, "unknown");
                        warn!(callback = %name, error = %detail, "callback skipped");
                    } else {
                        self.metrics.inc_callback(name, "failed");
                        error!(callback = %name, error = %detail, "callback failed");
                    }
                    CallbackReport {
                        name: name.clone(),
                        success: false,
                        error: Some(detail),
                    }
                }
            };
            reports.push(report);
        }
        reports
    }
}
