use consign_config::Settings;
use consign_engine::strategy_registry;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output::render_strategies;

pub(crate) fn handle_strategies(settings: &Settings, format: OutputFormat) -> CliResult<()> {
    let registry =
        strategy_registry(settings).map_err(|err| CliError::invalid_input(err.describe()))?;
    render_strategies(&registry.describe(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn configured_instances_are_listed_with_builtins() -> Result<()> {
        let settings = Settings::from_yaml_str(
            "strategies:\n  shot_tokens:\n    kind: tokenize\n    tokens:\n      show: 0\n",
        )?;
        let names: Vec<(String, &str)> = strategy_registry(&settings)?
            .describe()
            .into_iter()
            .map(|info| (info.name, info.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("copy".to_string(), "copy"),
                ("shot_tokens".to_string(), "tokenize"),
                ("symlink".to_string(), "symlink"),
                ("tokenize".to_string(), "tokenize"),
            ]
        );
        Ok(())
    }

    #[test]
    fn unknown_kind_is_invalid_input() -> Result<()> {
        let settings = Settings::from_yaml_str("strategies:\n  fast:\n    kind: rsync\n")?;
        let err = handle_strategies(&settings, OutputFormat::Table).err();
        assert_eq!(err.map(|e| e.exit_code()), Some(2));
        Ok(())
    }
}
