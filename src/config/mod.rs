mod types;

pub use types::*;

use crate::error::{Result, WizardError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "giftwizard")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| WizardError::Configuration("Could not determine config directory".to_string()))
}

/// Get the XDG-compliant data directory
pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "giftwizard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| WizardError::Configuration("Could not determine data directory".to_string()))
}

/// Get the config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from the default location, or defaults if there is none
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Load config from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(WizardError::Configuration(format!(
            "Configuration file not found at {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to a specific path
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Execute the key command and return the API key
pub fn get_api_key_from_command(command: &str) -> Result<String> {
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    };

    match output {
        Ok(output) => {
            if output.status.success() {
                let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if key.is_empty() {
                    Err(WizardError::Configuration(
                        "API key command returned empty output".to_string(),
                    ))
                } else {
                    Ok(key)
                }
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(WizardError::Configuration(format!(
                    "API key command failed: {}",
                    stderr.trim()
                )))
            }
        }
        Err(e) => Err(WizardError::Configuration(format!(
            "Failed to execute API key command: {}",
            e
        ))),
    }
}

/// Redact sensitive information from config for display
pub fn redact_config(config: &Config) -> Config {
    let mut redacted = config.clone();
    if redacted.api.key_command.is_some() {
        redacted.api.key_command = Some("[REDACTED]".to_string());
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.timeout_seconds = 30;
        config.settings.source = Some("https://example.com/settings.json".to_string());
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.api.timeout_seconds, 30);
        assert_eq!(loaded.api.cache_capacity, 0);
        assert_eq!(
            loaded.settings.source.as_deref(),
            Some("https://example.com/settings.json")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[logging]\nlog_format = \"json\"\n").unwrap();
        assert_eq!(config.logging.log_format, LogFormat::Json);
        assert_eq!(config.logging.log_level, LogLevel::Quiet);
        assert_eq!(config.api.timeout_seconds, 60);
        assert!(config.settings.source.is_none());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_config_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(WizardError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redact_key_command() {
        let mut config = Config::default();
        config.api.key_command = Some("pass show openai".to_string());
        let redacted = redact_config(&config);
        assert_eq!(redacted.api.key_command.as_deref(), Some("[REDACTED]"));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_command_output_is_trimmed() {
        let key = get_api_key_from_command("echo '  sk-test  '").unwrap();
        assert_eq!(key, "sk-test");
    }

    #[cfg(unix)]
    #[test]
    fn test_key_command_empty_output_fails() {
        assert!(get_api_key_from_command("true").is_err());
    }
}
