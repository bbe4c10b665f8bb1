//! Argument parsing and command dispatch.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use consign_config::{Settings, SettingsOrigin};
use consign_telemetry::{LogFormat, LoggingConfig, init_logging, log_format_from_config};
use tracing::{debug, info};

use crate::commands::deliver::handle_deliver;
use crate::commands::manifest::handle_manifest;
use crate::commands::strategies::handle_strategies;
use crate::error::{CliError, CliResult};

/// Parses CLI arguments and executes the requested command. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(cli: Cli) -> CliResult<()> {
    let (settings, origin) = load_settings(cli.config.as_deref())?;
    install_logging(&cli, &settings)?;
    origin.log();
    let label = command_label(&cli.command);
    debug!(command = label, "command started");

    let outcome = match cli.command {
        Command::Deliver(args) => handle_deliver(&settings, args).await,
        Command::Manifest(args) => handle_manifest(&settings, &args),
        Command::Strategies(args) => handle_strategies(&settings, args.format),
    };
    if outcome.is_ok() {
        info!(command = label, "command finished");
    }
    outcome
}

// Logging is not installed yet, so the origin is logged by the caller afterwards.
fn load_settings(path: Option<&Path>) -> CliResult<(Settings, SettingsOrigin)> {
    let (settings, origin) = Settings::load_with_origin(path)
        .map_err(|err| CliError::invalid_input(err.describe()))?;
    settings
        .validate()
        .map_err(|err| CliError::invalid_input(err.describe()))?;
    Ok((settings, origin))
}

fn install_logging(cli: &Cli, settings: &Settings) -> CliResult<()> {
    let format = cli.log_format.map_or_else(
        || log_format_from_config(settings.logging.format.as_deref()),
        LogFormat::from,
    );
    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    init_logging(&LoggingConfig { level, format })
        .map_err(|err| CliError::operational(anyhow::anyhow!(err.describe())))
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Deliver(_) => "deliver",
        Command::Manifest(_) => "manifest",
        Command::Strategies(_) => "strategies",
    }
}

#[derive(Parser)]
#[command(name = "consign", about = "Deliver VFX packages into structured delivery folders")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "CONSIGN_CONFIG",
        help = "Settings YAML file; defaults apply when absent"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "CONSIGN_LOG_LEVEL",
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub(crate) log_level: Option<String>,
    #[arg(long, global = true, value_enum, env = "CONSIGN_LOG_FORMAT")]
    pub(crate) log_format: Option<LogFormatArg>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Deliver a package description and emit the result record.
    Deliver(DeliverArgs),
    /// Render the manifest of a stored result record.
    Manifest(ManifestArgs),
    /// List the registered transfer strategies.
    Strategies(StrategiesArgs),
}

#[derive(Args)]
pub(crate) struct DeliverArgs {
    #[arg(help = "Path to the package description JSON")]
    pub(crate) input: PathBuf,
    #[arg(long, help = "Write the result JSON here instead of stdout")]
    pub(crate) output: Option<PathBuf>,
    #[arg(long, help = "Resolve paths and report without touching the filesystem")]
    pub(crate) dry_run: bool,
    #[arg(long, env = "CONSIGN_DELIVERY_ROOT", help = "Override the configured delivery root")]
    pub(crate) delivery_root: Option<PathBuf>,
    #[arg(long, help = "Write Prometheus text metrics here after the delivery")]
    pub(crate) metrics_file: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ManifestArgs {
    #[arg(help = "Path to a result JSON emitted by `deliver`")]
    pub(crate) result: PathBuf,
    #[arg(long, help = "Directory holding manifest templates")]
    pub(crate) template_dir: Option<PathBuf>,
    #[arg(long, help = "Template name inside the template directory")]
    pub(crate) template_name: Option<String>,
}

#[derive(Args)]
pub(crate) struct StrategiesArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}
