//! Output renderers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use consign_model::DeliveryResult;
use consign_transfer::StrategyInfo;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

/// Emit the result record as pretty JSON to `output`, or stdout when unset.
pub(crate) fn write_result(result: &DeliveryResult, output: Option<&Path>) -> CliResult<()> {
    let text = result
        .to_json_pretty()
        .map_err(|err| CliError::operational(anyhow!(err.describe())))?;
    match output {
        Some(path) => {
            write_text(path, &text)?;
            tracing::info!(path = %path.display(), "result written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Write `text` to `path`, creating parent directories.
pub(crate) fn write_text(path: &Path, text: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))
            .map_err(CliError::operational)?;
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write {}", path.display()))
        .map_err(CliError::operational)
}

#[derive(Serialize)]
struct StrategyRow<'a> {
    name: &'a str,
    kind: &'a str,
}

/// Render registered strategies.
pub(crate) fn render_strategies(
    strategies: &[StrategyInfo],
    format: OutputFormat,
) -> CliResult<()> {
    println!("{}", format_strategies(strategies, format)?);
    Ok(())
}

fn format_strategies(strategies: &[StrategyInfo], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<StrategyRow<'_>> = strategies
                .iter()
                .map(|info| StrategyRow {
                    name: &info.name,
                    kind: info.kind,
                })
                .collect();
            serde_json::to_string_pretty(&rows)
                .map_err(|err| CliError::operational(anyhow!("failed to format JSON: {err}")))
        }
        OutputFormat::Table => {
            let width = strategies
                .iter()
                .map(|info| info.name.len())
                .max()
                .unwrap_or(0)
                .max("NAME".len());
            let mut lines = vec![format!("{:<width$}  KIND", "NAME")];
            lines.extend(
                strategies
                    .iter()
                    .map(|info| format!("{:<width$}  {}", info.name, info.kind)),
            );
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn plain<T>(result: CliResult<T>) -> Result<T> {
        result.map_err(|err| anyhow!(err.display_message()))
    }

    fn infos() -> Vec<StrategyInfo> {
        vec![
            StrategyInfo {
                name: "copy".into(),
                kind: "copy",
            },
            StrategyInfo {
                name: "shot_tokens".into(),
                kind: "tokenize",
            },
        ]
    }

    #[test]
    fn table_aligns_kinds() -> Result<()> {
        let text = plain(format_strategies(&infos(), OutputFormat::Table))?;
        assert_eq!(
            text,
            "NAME         KIND\ncopy         copy\nshot_tokens  tokenize"
        );
        Ok(())
    }

    #[test]
    fn json_lists_name_and_kind() -> Result<()> {
        let text = plain(format_strategies(&infos(), OutputFormat::Json))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value[1]["name"], "shot_tokens");
        assert_eq!(value[1]["kind"], "tokenize");
        Ok(())
    }

    #[test]
    fn result_file_is_written_with_parents() -> Result<()> {
        let dir = tempfile::Builder::new().prefix("consign-output-").tempdir()?;
        let path = dir.path().join("nested/result.json");
        let result = DeliveryResult {
            package_name: "PKG".into(),
            delivery_path: "/out/PKG".into(),
            manifest_path: "/out/PKG/manifest.md".into(),
            timestamp: "2024-05-01 10:00:00".into(),
            results: Vec::new(),
            summary: "Delivered 0 of 0 files.".into(),
        };
        plain(write_result(&result, Some(&path)))?;
        let stored = DeliveryResult::from_json(&fs::read_to_string(&path)?)?;
        assert_eq!(stored, result);
        Ok(())
    }
}
