use serde::{Deserialize, Serialize};

/// Application config, read from `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub settings: SettingsSourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Command to execute to retrieve the API key
    #[serde(default)]
    pub key_command: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum cached responses; 0 keeps every response for the process lifetime
    #[serde(default)]
    pub cache_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            key_command: None,
            timeout_seconds: default_timeout(),
            cache_capacity: 0,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSourceConfig {
    /// URL or file path of the shared settings document
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Quiet,
    Normal,
    Verbose,
}

impl LogLevel {
    /// Equivalent `-v` count
    pub fn verbosity(self) -> u8 {
        match self {
            LogLevel::Quiet => 0,
            LogLevel::Normal => 1,
            LogLevel::Verbose => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Validate the configuration, returning warnings or errors
    pub fn validate(&self) -> Result<Vec<String>, Vec<String>> {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.api.timeout_seconds == 0 {
            errors.push("api.timeout_seconds must be greater than 0".to_string());
        }

        if let Some(ref command) = self.api.key_command {
            if command.trim().is_empty() {
                warnings.push("api.key_command is set but empty".to_string());
            }
        }

        if let Some(ref source) = self.settings.source {
            if source.trim().is_empty() {
                errors.push("settings.source is set but empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}
