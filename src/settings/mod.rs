//! Layered wizard settings.
//!
//! Effective settings are `defaults ⊕ fetched ⊕ override`, where the fetched
//! layer comes from a shared settings document (URL or file) and the override
//! is whatever the user last saved into the durable store.

mod defaults;
mod types;

pub use defaults::*;
pub use types::*;

use crate::error::{Result, WizardError};
use crate::storage::{KvStore, CUSTOM_SETTINGS_KEY};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Merge layers left to right; later layers win per field.
pub fn merge(
    defaults: &Settings,
    fetched: Option<&SettingsLayer>,
    persisted: Option<&SettingsLayer>,
) -> Settings {
    let mut merged = defaults.clone();
    for layer in [fetched, persisted].into_iter().flatten() {
        merged.apply(layer);
    }
    merged
}

/// Where the shared settings document lives
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsSource {
    Url(Url),
    File(PathBuf),
}

impl SettingsSource {
    /// Interpret `http(s)://` and `file://` URLs as such; anything else is a path
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => SettingsSource::Url(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => SettingsSource::File(path),
                Err(()) => SettingsSource::File(PathBuf::from(source)),
            },
            _ => SettingsSource::File(PathBuf::from(source)),
        }
    }

    async fn fetch(&self, http: &Client) -> Result<SettingsLayer> {
        let body = match self {
            SettingsSource::Url(url) => {
                let response = http
                    .get(url.clone())
                    .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            WizardError::Timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
                        } else {
                            WizardError::Transport(format!("Failed to fetch settings: {}", e))
                        }
                    })?;
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                if !status.is_success() {
                    return Err(WizardError::Api {
                        status: status.as_u16(),
                        body: text,
                    });
                }
                text
            }
            SettingsSource::File(path) => tokio::fs::read_to_string(path).await?,
        };

        Ok(serde_json::from_str::<SettingsLayer>(&body)?.strip_legacy("fetched settings"))
    }
}

impl std::fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsSource::Url(url) => write!(f, "{}", url),
            SettingsSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolves and persists the effective settings
pub struct SettingsStore {
    defaults: Settings,
    source: Option<SettingsSource>,
    storage: KvStore,
    http: Client,
    current: Settings,
}

impl SettingsStore {
    pub fn new(storage: KvStore, source: Option<SettingsSource>) -> Self {
        Self::with_defaults(default_settings(), storage, source)
    }

    pub fn with_defaults(defaults: Settings, storage: KvStore, source: Option<SettingsSource>) -> Self {
        SettingsStore {
            current: defaults.clone(),
            defaults,
            source,
            storage,
            http: Client::new(),
        }
    }

    /// Fetch the shared document, merge every layer and make the result current
    pub async fn initialize(&mut self) -> Result<&Settings> {
        let fetched = self.fetch_layer().await;
        let persisted = self.persisted_override()?;

        let merged = merge(&self.defaults, fetched.as_ref(), persisted.as_ref());
        merged.validate()?;

        tracing::debug!(
            fetched = fetched.is_some(),
            persisted = persisted.is_some(),
            model = %merged.model,
            steps = merged.step_count(),
            "settings initialized"
        );
        self.current = merged;
        Ok(&self.current)
    }

    /// Current settings, without any I/O
    pub fn settings(&self) -> &Settings {
        &self.current
    }

    /// Overlay `partial` onto the current settings and persist the result
    pub fn save(&mut self, partial: SettingsLayer) -> Result<&Settings> {
        let partial = partial.strip_legacy("saved settings");
        let mut updated = self.current.clone();
        updated.apply(&partial);
        updated.validate()?;

        self.storage.set(CUSTOM_SETTINGS_KEY, &serde_json::to_string(&updated)?)?;
        tracing::info!("settings saved");
        self.current = updated;
        Ok(&self.current)
    }

    /// Discard the persisted override and re-resolve from defaults and the shared document
    pub async fn reset(&mut self) -> Result<&Settings> {
        let fetched = self.fetch_layer().await;
        let merged = merge(&self.defaults, fetched.as_ref(), None);
        merged.validate()?;

        self.storage.remove(CUSTOM_SETTINGS_KEY)?;
        tracing::info!("settings reset");
        self.current = merged;
        Ok(&self.current)
    }

    /// Save a settings document (full or partial) as the new override
    pub fn import(&mut self, json: &str) -> Result<&Settings> {
        let layer: SettingsLayer = serde_json::from_str(json)?;
        if layer.is_empty() {
            return Err(WizardError::Configuration(
                "Imported document contains no settings".to_string(),
            ));
        }
        self.save(layer)
    }

    /// Current settings as a pretty-printed JSON document
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.current)?)
    }

    pub fn source(&self) -> Option<&SettingsSource> {
        self.source.as_ref()
    }

    /// Whether a saved override exists
    pub fn has_override(&self) -> Result<bool> {
        Ok(self.storage.get(CUSTOM_SETTINGS_KEY)?.is_some())
    }

    async fn fetch_layer(&self) -> Option<SettingsLayer> {
        let source = self.source.as_ref()?;
        match source.fetch(&self.http).await {
            Ok(layer) => Some(layer),
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "failed to load settings document");
                None
            }
        }
    }

    fn persisted_override(&self) -> Result<Option<SettingsLayer>> {
        let Some(raw) = self.storage.get(CUSTOM_SETTINGS_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<SettingsLayer>(&raw) {
            Ok(layer) => Ok(Some(layer.strip_legacy("saved settings"))),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable saved settings");
                Ok(None)
            }
        }
    }
}
