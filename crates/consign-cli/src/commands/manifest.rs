use std::fs;

use anyhow::Context;
use consign_config::Settings;
use consign_model::DeliveryResult;
use consign_template::{DEFAULT_MANIFEST_TEMPLATE, ManifestContext, render_manifest};

use crate::cli::ManifestArgs;
use crate::error::{CliError, CliResult};

pub(crate) fn handle_manifest(settings: &Settings, args: &ManifestArgs) -> CliResult<()> {
    println!("{}", manifest_text(settings, args)?);
    Ok(())
}

fn manifest_text(settings: &Settings, args: &ManifestArgs) -> CliResult<String> {
    let text = fs::read_to_string(&args.result)
        .with_context(|| format!("failed to read {}", args.result.display()))
        .map_err(CliError::operational)?;
    let result = DeliveryResult::from_json(&text)
        .map_err(|err| CliError::invalid_input(err.describe()))?;

    let template_dir = args
        .template_dir
        .as_deref()
        .or(settings.paths.template_dir.as_deref());
    let template_name = args
        .template_name
        .as_deref()
        .unwrap_or(DEFAULT_MANIFEST_TEMPLATE);
    let context = ManifestContext::from_result(&result);
    render_manifest(template_name, template_dir, &context)
        .map_err(|err| CliError::invalid_input(err.describe()))
}
