mod cli;
mod config;
mod error;
mod llm;
mod settings;
mod storage;
mod transcript;
mod ui;
mod wizard;

use clap::Parser;
use cli::{AppContext, Cli, Commands};
use config::{LogFormat, LoggingConfig};
use error::{ExitStatus, Result};
use std::process::ExitCode;
use storage::KvStore;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up even when the config fails to load
    let loaded = cli::load_app_config(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|(config, _)| config.logging.clone())
        .unwrap_or_default();
    setup_logging(cli.verbose, cli.quiet, cli.log_format.as_deref(), &logging);
    ui::set_quiet_mode(cli.quiet);

    let result = match loaded {
        Ok((config, path)) => run_command(cli, config, path).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitStatus::Success.into(),
        Err(e) => {
            ui::print_error(&e.to_string());
            e.exit_status().into()
        }
    }
}

async fn run_command(cli: Cli, config: config::Config, config_path: std::path::PathBuf) -> Result<()> {
    // `config` subcommands run even on an invalid config
    if !matches!(cli.command, Some(Commands::Config { .. })) {
        cli::check_config(&config)?;
    }

    let storage = KvStore::open_default()?;
    tracing::debug!(path = %storage.path().display(), "using storage file");
    cli::notice_new_version(&storage);
    let ctx = AppContext::new(config, config_path, storage, cli.api_key);

    match cli.command {
        None | Some(Commands::Ask) => cli::run_ask(&ctx).await,

        Some(Commands::Recommend { answers, json }) => cli::run_recommend(&ctx, answers, json).await,

        Some(Commands::Settings { command }) => cli::run_settings(&ctx, command).await,

        Some(Commands::Key { command }) => cli::run_key(&ctx, command),

        Some(Commands::Config { command }) => cli::run_config(&ctx, command),

        Some(Commands::Last { json, clear }) => cli::run_last(&ctx, json, clear),
    }
}

fn setup_logging(verbose: u8, quiet: bool, format: Option<&str>, config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Flags win over the config file
    let verbosity = if verbose > 0 {
        verbose
    } else {
        config.log_level.verbosity()
    };
    let level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let json = match format {
        Some(format) => format.eq_ignore_ascii_case("json"),
        None => config.log_format == LogFormat::Json,
    };

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().without_time().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
