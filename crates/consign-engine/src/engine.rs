//! Delivery orchestration: package in, result record out.
//!
//! Items run one at a time in package order, and so do the files of a directory item. Every
//! resolved file produces exactly one [`ItemResult`]; only package-level problems abort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use consign_config::Settings;
use consign_model::{
    DeliveryPackage, DeliveryResult, ItemResult, Metadata, PackageItem, summarize,
    validate_package_name,
};
use consign_telemetry::Metrics;
use consign_template::{TemplateError, TemplateRenderer};
use consign_transfer::{SharedStrategy, StrategyRegistry, TransferOutcome, TransferRequest};
use tracing::{debug, info, instrument, warn};

use crate::callbacks::{CallbackDispatcher, CallbackRegistry, CallbackReport};
use crate::error::{EngineError, EngineResult};
use crate::resolve::{file_metadata, resolve_files};

/// File name of the manifest inside the delivery folder.
pub const MANIFEST_FILE_NAME: &str = "manifest.md";
/// Error text recorded when an item's source is missing.
pub const SOURCE_NOT_FOUND: &str = "source not found";
/// Timestamp layout of [`DeliveryResult::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FailureKind {
    SourceNotFound,
    UnknownStrategy,
    ResolveFiles,
    PrepareDestination,
    Transfer,
}

impl FailureKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::SourceNotFound => "source_not_found",
            Self::UnknownStrategy => "unknown_strategy",
            Self::ResolveFiles => "resolve_files",
            Self::PrepareDestination => "prepare_destination",
            Self::Transfer => "transfer",
        }
    }
}

/// Per-package values shared by every file of a delivery.
struct DeliveryScope<'a> {
    package: &'a DeliveryPackage,
    delivery_path: &'a Path,
}

/// Executes delivery packages.
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    default_root: PathBuf,
    strategies: StrategyRegistry,
    dispatcher: CallbackDispatcher,
    metrics: Metrics,
    renderer: TemplateRenderer,
}

/// Built-in strategies plus the named instances configured in `settings`.
///
/// # Errors
///
/// Returns [`EngineError::StrategyConfig`] for an unknown kind or malformed options.
pub fn strategy_registry(settings: &Settings) -> EngineResult<StrategyRegistry> {
    let mut strategies = StrategyRegistry::with_builtins();
    for (name, instance) in &settings.strategies {
        strategies
            .configure(name, instance.kind_or(name), &instance.options)
            .map_err(|source| EngineError::StrategyConfig {
                name: name.clone(),
                source,
            })?;
    }
    Ok(strategies)
}

impl DeliveryEngine {
    /// Engine over explicit registries.
    #[must_use]
    pub fn new(
        default_root: impl Into<PathBuf>,
        strategies: StrategyRegistry,
        dispatcher: CallbackDispatcher,
        metrics: Metrics,
    ) -> Self {
        Self {
            default_root: default_root.into(),
            strategies,
            dispatcher,
            metrics,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Engine wired from settings: built-in strategies plus configured instances, built-in
    /// callbacks with settings defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StrategyConfig`] for an unknown kind or malformed options and
    /// [`EngineError::HttpClient`] if the callback HTTP client cannot be built.
    pub fn from_settings(settings: &Settings, metrics: Metrics) -> EngineResult<Self> {
        let strategies = strategy_registry(settings)?;
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|source| EngineError::HttpClient { source })?;
        let callbacks =
            CallbackRegistry::with_builtins(settings.paths.template_dir.clone(), client);
        let dispatcher =
            CallbackDispatcher::new(callbacks, settings.callbacks.clone(), metrics.clone());

        Ok(Self::new(
            settings.storage.root.clone(),
            strategies,
            dispatcher,
            metrics,
        ))
    }

    /// Registered transfer strategies.
    #[must_use]
    pub const fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Metrics handle shared with the caller.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Deliver `package` and run its callbacks.
    ///
    /// Callback failures are logged and counted; they never change the returned result.
    ///
    /// # Errors
    ///
    /// See [`DeliveryEngine::execute`].
    pub async fn deliver(&self, package: &DeliveryPackage) -> EngineResult<DeliveryResult> {
        let result = self.execute(package)?;
        let reports = self.dispatch_callbacks(&result, package).await;
        let failed = reports.iter().filter(|report| !report.success).count();
        if failed > 0 {
            warn!(
                package = %result.package_name,
                failed,
                total = reports.len(),
                "some callbacks failed"
            );
        }
        Ok(result)
    }

    /// Run the callbacks `package` requests against a finished `result`.
    pub async fn dispatch_callbacks(
        &self,
        result: &DeliveryResult,
        package: &DeliveryPackage,
    ) -> Vec<CallbackReport> {
        self.dispatcher
            .dispatch(result, &package.callbacks, package.dry_run)
            .await
    }

    /// Deliver every item of `package` without running callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPackage`] for an unsafe package name and
    /// [`EngineError::DeliveryRoot`] if the delivery folder cannot be created. Per-file problems
    /// are recorded in the result instead.
    #[instrument(
        name = "delivery_engine.execute",
        skip(self, package),
        fields(package = %package.package_name, dry_run = package.dry_run)
    )]
    pub fn execute(&self, package: &DeliveryPackage) -> EngineResult<DeliveryResult> {
        validate_package_name(&package.package_name)
            .map_err(|source| EngineError::InvalidPackage { source })?;

        let started = Instant::now();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let delivery_path = package.delivery_path(&self.default_root);

        if package.dry_run {
            info!(path = %delivery_path.display(), "dry run: delivery folder not created");
        } else {
            fs::create_dir_all(&delivery_path).map_err(|source| EngineError::DeliveryRoot {
                path: delivery_path.clone(),
                source,
            })?;
        }
        info!(
            items = package.items.len(),
            path = %delivery_path.display(),
            "delivery started"
        );

        let scope = DeliveryScope {
            package,
            delivery_path: &delivery_path,
        };
        let mut results = Vec::new();
        for item in &package.items {
            self.deliver_item(&scope, item, &mut results);
        }

        let summary = summarize(&results);
        let result = DeliveryResult {
            package_name: package.package_name.clone(),
            delivery_path: delivery_path.display().to_string(),
            manifest_path: delivery_path.join(MANIFEST_FILE_NAME).display().to_string(),
            timestamp,
            results,
            summary,
        };

        self.metrics.inc_delivery(result.is_complete());
        self.metrics.observe_delivery_duration(started.elapsed());
        info!(
            succeeded = result.succeeded_count(),
            failed = result.failed_count(),
            summary = %result.summary,
            "delivery finished"
        );
        Ok(result)
    }

    fn deliver_item(
        &self,
        scope: &DeliveryScope<'_>,
        item: &PackageItem,
        out: &mut Vec<ItemResult>,
    ) {
        let source = &item.source_path;
        let description = item.description().map(str::to_string);
        let item_failure = |kind: FailureKind, error: String| {
            self.metrics.inc_item_failure(kind.as_str());
            warn!(source = %source.display(), error = %error, kind = kind.as_str(), "item failed");
            ItemResult::failed(
                source.display().to_string(),
                String::new(),
                description.clone(),
                error,
            )
        };

        if !source.exists() {
            out.push(item_failure(
                FailureKind::SourceNotFound,
                SOURCE_NOT_FOUND.to_string(),
            ));
            return;
        }

        let chain = match self.strategies.resolve_chain(&item.process_method) {
            Ok(chain) => chain,
            Err(err) => {
                out.push(item_failure(FailureKind::UnknownStrategy, err.describe()));
                return;
            }
        };

        let files = match resolve_files(source) {
            Ok(files) => files,
            Err(err) => {
                out.push(item_failure(
                    FailureKind::ResolveFiles,
                    format!("failed to list {}: {err}", source.display()),
                ));
                return;
            }
        };
        if files.is_empty() {
            warn!(source = %source.display(), "item directory is empty; nothing to deliver");
            return;
        }

        debug!(
            source = %source.display(),
            chain = %item.process_method.label(),
            files = files.len(),
            "item resolved"
        );
        let kind = chain.last().map_or("none", |strategy| strategy.kind());
        for file in &files {
            let result = self.deliver_file(scope, item, &chain, file, description.clone());
            self.metrics.inc_file(kind, result.success);
            out.push(result);
        }
    }

    fn deliver_file(
        &self,
        scope: &DeliveryScope<'_>,
        item: &PackageItem,
        chain: &[SharedStrategy],
        file: &Path,
        description: Option<String>,
    ) -> ItemResult {
        let dry_run = scope.package.dry_run;
        let metadata = file_metadata(item, file, scope.package);
        let relative = self.relative_destination(&item.target_template, file, &metadata);
        let destination = scope.delivery_path.join(relative);
        let source_text = file.display().to_string();
        let fail = |kind: FailureKind, destination: &Path, error: String| {
            self.metrics.inc_item_failure(kind.as_str());
            warn!(source = %source_text, error = %error, kind = kind.as_str(), "file failed");
            ItemResult::failed(
                source_text.clone(),
                destination.display().to_string(),
                description.clone(),
                error,
            )
        };

        if !dry_run
            && let Some(parent) = destination.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            return fail(
                FailureKind::PrepareDestination,
                &destination,
                format!("failed to create {}: {err}", parent.display()),
            );
        }

        let mut current = TransferOutcome {
            destination,
            metadata,
        };
        for strategy in chain {
            let request = TransferRequest {
                source: file,
                destination: &current.destination,
                metadata: &current.metadata,
                dry_run,
            };
            match strategy.transfer(request) {
                Ok(outcome) => current = outcome,
                Err(err) => {
                    return fail(FailureKind::Transfer, &current.destination, err.describe());
                }
            }
        }

        debug!(
            source = %source_text,
            destination = %current.destination.display(),
            dry_run,
            "file delivered"
        );
        ItemResult::succeeded(
            source_text,
            current.destination.display().to_string(),
            description,
        )
    }

    /// Rendered destination relative to the delivery folder, or the file name when the template
    /// fails.
    fn relative_destination(&self, template: &str, file: &Path, metadata: &Metadata) -> PathBuf {
        match self.renderer.render_relative_path(template, metadata) {
            Ok(path) => path,
            Err(err) => {
                let reason = match &err {
                    TemplateError::UnsafePath { .. } => "unsafe_path",
                    TemplateError::Render { .. } | TemplateError::Manifest { .. } => "render",
                };
                self.metrics.inc_template_fallback(reason);
                warn!(
                    template,
                    source = %file.display(),
                    error = %err.describe(),
                    "destination template failed; using original file name"
                );
                file.file_name().map(PathBuf::from).unwrap_or_default()
            }
        }
    }
}
