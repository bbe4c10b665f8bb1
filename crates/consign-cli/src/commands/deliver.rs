use std::fs;

use anyhow::{Context, anyhow};
use consign_config::Settings;
use consign_engine::{DeliveryEngine, EngineError};
use consign_model::DeliveryPackage;
use consign_telemetry::Metrics;
use tracing::info;

use crate::cli::DeliverArgs;
use crate::error::{CliError, CliResult};
use crate::output::{write_result, write_text};

pub(crate) async fn handle_deliver(settings: &Settings, args: DeliverArgs) -> CliResult<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))
        .map_err(CliError::operational)?;
    let mut package = DeliveryPackage::from_json(&text)
        .map_err(|err| CliError::invalid_input(err.describe()))?;
    package
        .validate()
        .map_err(|err| CliError::invalid_input(err.describe()))?;
    if args.dry_run {
        package.dry_run = true;
    }

    let mut settings = settings.clone();
    if let Some(root) = args.delivery_root {
        settings = settings.with_storage_root(root);
    }
    let metrics =
        Metrics::new().map_err(|err| CliError::operational(anyhow!(err.describe())))?;
    let engine = DeliveryEngine::from_settings(&settings, metrics)
        .map_err(classify_engine_error)?;

    let result = engine
        .deliver(&package)
        .await
        .map_err(classify_engine_error)?;
    info!(
        package = %result.package_name,
        summary = %result.summary,
        dry_run = package.dry_run,
        "delivery complete"
    );

    write_result(&result, args.output.as_deref())?;

    if let Some(path) = &args.metrics_file {
        let exposition = engine
            .metrics()
            .render()
            .map_err(|err| CliError::operational(anyhow!(err.describe())))?;
        write_text(path, &exposition)?;
    }
    Ok(())
}

fn classify_engine_error(err: EngineError) -> CliError {
    match err {
        EngineError::InvalidPackage { .. } | EngineError::StrategyConfig { .. } => {
            CliError::invalid_input(err.describe())
        }
        EngineError::DeliveryRoot { .. } | EngineError::HttpClient { .. } => {
            CliError::operational(anyhow!(err.describe()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_model::DeliveryResult;
    use consign_test_support::fixtures::{DeliveryWorkspace, PackageBuilder};
    use std::path::PathBuf;

    fn plain<T>(result: CliResult<T>) -> Result<T> {
        result.map_err(|err| anyhow!(err.display_message()))
    }

    fn args(input: PathBuf, output: PathBuf) -> DeliverArgs {
        DeliverArgs {
            input,
            output: Some(output),
            dry_run: false,
            delivery_root: None,
            metrics_file: None,
        }
    }

    fn write_package(workspace: &DeliveryWorkspace, package: &DeliveryPackage) -> Result<PathBuf> {
        let path = workspace.root().join("package.json");
        fs::write(&path, serde_json::to_string(package)?)?;
        Ok(path)
    }

    #[tokio::test]
    async fn delivers_and_writes_result_and_metrics() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let file = workspace.write_source("a.txt", "a")?;
        let package = PackageBuilder::new("PKG_CLI")
            .item(&file, "docs/{{ filename }}")
            .item(workspace.sources().join("missing.txt"), "{{ filename }}")
            .build();
        let input = write_package(&workspace, &package)?;
        let output = workspace.root().join("out/result.json");
        let metrics = workspace.root().join("out/metrics.prom");
        let mut deliver = args(input, output.clone());
        deliver.delivery_root = Some(workspace.deliveries());
        deliver.metrics_file = Some(metrics.clone());

        plain(handle_deliver(&Settings::default(), deliver).await)?;

        let result = DeliveryResult::from_json(&fs::read_to_string(&output)?)?;
        assert_eq!(result.summary, "Delivered 1 of 2 files.");
        assert!(workspace.deliveries().join("PKG_CLI/docs/a.txt").is_file());
        let exposition = fs::read_to_string(&metrics)?;
        assert!(exposition.contains("consign_deliveries_total"));
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_flag_overrides_package() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let file = workspace.write_source("a.txt", "a")?;
        let package = PackageBuilder::new("PKG_DRY").item(&file, "{{ filename }}").build();
        let input = write_package(&workspace, &package)?;
        let output = workspace.root().join("result.json");
        let mut deliver = args(input, output.clone());
        deliver.dry_run = true;
        deliver.delivery_root = Some(workspace.deliveries());

        plain(handle_deliver(&Settings::default(), deliver).await)?;

        assert!(output.is_file());
        assert!(workspace.tree(&workspace.deliveries())?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_package_is_invalid_input() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let input = workspace.root().join("package.json");
        fs::write(&input, r#"{"package_name": "PKG", "items": "nope"}"#)?;
        let output = workspace.root().join("result.json");

        let err = handle_deliver(&Settings::default(), args(input, output.clone()))
            .await
            .err();
        assert_eq!(err.map(|e| e.exit_code()), Some(2));
        assert!(!output.exists());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_input_is_a_failure() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let input = workspace.root().join("absent.json");
        let output = workspace.root().join("result.json");

        let err = handle_deliver(&Settings::default(), args(input, output))
            .await
            .err();
        assert_eq!(err.map(|e| e.exit_code()), Some(3));
        Ok(())
    }
}
