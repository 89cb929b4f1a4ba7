mod ask;
mod config_cmd;
mod key_cmd;
mod last;
mod recommend;
mod settings_cmd;

pub use ask::run_ask;
pub use config_cmd::run_config;
pub use key_cmd::run_key;
pub use last::run_last;
pub use recommend::run_recommend;
pub use settings_cmd::run_settings;

use crate::config::{self, Config};
use crate::error::{Result, WizardError};
use crate::llm::{ApiClient, CachePolicy, GiftRecommendations, HttpTransport};
use crate::settings::{Settings, SettingsSource, SettingsStore};
use crate::storage::KvStore;
use crate::ui;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "giftwizard")]
#[command(author, version, about = "Answer a few questions and get gift ideas")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (can repeat: -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log format: text (default) or json
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// OpenAI API key (overrides every other source)
    #[arg(long, value_name = "KEY", global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive wizard (default)
    Ask,

    /// Get recommendations for answers given on the command line
    Recommend {
        /// Answer to the next question, in order (repeat for each question)
        #[arg(short, long = "answer", value_name = "TEXT", required = true)]
        answers: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage wizard settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Manage the application config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show answers from the last completed session
    Last {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Forget the saved answers
        #[arg(long, conflicts_with = "json")]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show effective settings
    Show,

    /// Print effective settings as JSON
    Export,

    /// Save a settings JSON document as the local override
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Remove the local override
    Reset,

    /// Check that effective settings are usable
    Validate,

    /// Change individual settings
    Set {
        /// Chat model name
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature (0 to 2)
        #[arg(long)]
        temperature: Option<f64>,
    },
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Store an API key (prompts when omitted)
    Set {
        key: Option<String>,
    },

    /// Remove the stored API key
    Clear,

    /// Show where the API key would come from
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show config (secrets redacted)
    Show,

    /// Print config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Everything a command needs from the environment
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub storage: KvStore,
    pub api_key: Option<String>,
}

impl AppContext {
    pub fn new(config: Config, config_path: PathBuf, storage: KvStore, api_key: Option<String>) -> Self {
        AppContext {
            config,
            config_path,
            storage,
            api_key,
        }
    }

    pub fn settings_store(&self) -> SettingsStore {
        let source = self.config.settings.source.as_deref().map(SettingsSource::parse);
        SettingsStore::new(self.storage.clone(), source)
    }

    /// Build the request pipeline for `settings`
    pub fn api_client(&self, settings: &Settings, api_key: &str) -> Result<ApiClient> {
        let transport = HttpTransport::new(api_key)?;
        Ok(ApiClient::new(transport, settings)
            .with_timeout(Duration::from_secs(self.config.api.timeout_seconds))
            .with_cache_policy(CachePolicy::from_capacity(self.config.api.cache_capacity)))
    }
}

/// Load the config from `path`, or from the default location. A missing file
/// means defaults.
pub fn load_app_config(path: Option<&Path>) -> Result<(Config, PathBuf)> {
    match path {
        Some(path) if !path.exists() => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok((Config::default(), path.to_path_buf()))
        }
        Some(path) => Ok((config::load_config_from(path)?, path.to_path_buf())),
        None => Ok((config::load_config()?, config::config_path()?)),
    }
}

/// Reject an unusable config before any command relies on it. Warnings are
/// printed and do not fail.
pub fn check_config(config: &Config) -> Result<()> {
    match config.validate() {
        Ok(warnings) => {
            for warning in warnings {
                ui::print_warning(&warning);
            }
            Ok(())
        }
        Err(errors) => Err(WizardError::Configuration(errors.join("; "))),
    }
}

/// Tell the user when the version differs from the one seen last time
pub fn notice_new_version(storage: &KvStore) {
    let current = env!("CARGO_PKG_VERSION");
    let previous = match storage.last_version() {
        Ok(previous) => previous,
        Err(e) => {
            tracing::debug!(error = %e, "could not read last version");
            return;
        }
    };
    if previous.as_deref() == Some(current) {
        return;
    }
    if let Some(previous) = previous {
        ui::print_info(&format!("giftwizard was updated from {} to {}", previous, current));
    }
    if let Err(e) = storage.set_last_version(current) {
        tracing::warn!(error = %e, "could not record version");
    }
}

/// Print recommendations as a numbered list with an optional cost line
pub(crate) fn print_recommendations(
    recommendations: &GiftRecommendations,
    model: &str,
    total_tokens: Option<u64>,
) {
    for (i, (keyword, description)) in recommendations.items().enumerate() {
        if description.is_empty() {
            println!("{:>2}. {}", i + 1, console::style(keyword).bold());
        } else {
            println!("{:>2}. {} - {}", i + 1, console::style(keyword).bold(), description);
        }
    }

    if let Some(tokens) = total_tokens {
        match crate::llm::estimate_cost(model, tokens) {
            Some(usd) => ui::print_info(&format!(
                "{} tokens, about ${:.4} (₩{:.1})",
                tokens,
                usd,
                crate::llm::usd_to_krw(usd)
            )),
            None => ui::print_info(&format!("{} tokens", tokens)),
        }
    }
}
