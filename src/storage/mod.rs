//! Durable key-value storage for persisted overrides, the last used API key and
//! last-session information.
//!
//! Everything lives in one JSON object file (`storage.json`) in the data
//! directory. Mutations hold an exclusive lock on `storage.lock` while they
//! read, modify and rewrite the file.

mod lock;

use lock::FileLock;

use crate::config;
use crate::error::Result;
use crate::transcript::Exchange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted settings override layer
pub const CUSTOM_SETTINGS_KEY: &str = "customSettings";
/// Last API key accepted by the wizard
pub const API_KEY_KEY: &str = "openai_api_key";
/// Application version seen on the previous run
pub const LAST_VERSION_KEY: &str = "lastVersion";
/// Answers from the last completed session
pub const LAST_SETTINGS_KEY: &str = "lastSettings";

/// Default lock timeout in seconds
const LOCK_TIMEOUT_SECS: u64 = 5;

/// Answers from a completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSnapshot {
    pub saved_at: DateTime<Utc>,
    pub answers: Vec<Exchange>,
}

#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    /// Open the store rooted at `dir`. The file is created on first write.
    pub fn open(dir: &Path) -> Self {
        KvStore {
            path: dir.join("storage.json"),
        }
    }

    /// Open the store in the XDG data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(&config::data_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let _lock = FileLock::acquire(&self.path, Duration::from_secs(LOCK_TIMEOUT_SECS))?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        tracing::debug!(key, "stored value");
        Ok(())
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&self, key: &str) -> Result<bool> {
        let _lock = FileLock::acquire(&self.path, Duration::from_secs(LOCK_TIMEOUT_SECS))?;
        let mut entries = self.read_all()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries)?;
            tracing::debug!(key, "removed value");
        }
        Ok(existed)
    }

    pub fn last_version(&self) -> Result<Option<String>> {
        self.get(LAST_VERSION_KEY)
    }

    pub fn set_last_version(&self, version: &str) -> Result<()> {
        self.set(LAST_VERSION_KEY, version)
    }

    pub fn last_answers(&self) -> Result<Option<AnswerSnapshot>> {
        match self.get(LAST_SETTINGS_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_last_answers(&self, answers: &[Exchange]) -> Result<()> {
        let snapshot = AnswerSnapshot {
            saved_at: Utc::now(),
            answers: answers.to_vec(),
        };
        self.set(LAST_SETTINGS_KEY, &serde_json::to_string(&snapshot)?)
    }

    pub fn clear_last_answers(&self) -> Result<bool> {
        self.remove(LAST_SETTINGS_KEY)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // `mode` only applies on create
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path());
        assert_eq!(store.get("missing").unwrap(), None);

        store.set(API_KEY_KEY, "sk-abc").unwrap();
        store.set(LAST_VERSION_KEY, "0.1.0").unwrap();

        let reopened = KvStore::open(dir.path());
        assert_eq!(reopened.get(API_KEY_KEY).unwrap().as_deref(), Some("sk-abc"));
        assert_eq!(reopened.last_version().unwrap().as_deref(), Some("0.1.0"));
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path());
        std::fs::write(store.path(), "{}").unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.set(API_KEY_KEY, "sk-secret").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "mode was {:o}", mode);
        assert_eq!(store.get(API_KEY_KEY).unwrap().as_deref(), Some("sk-secret"));
    }

    #[test]
    fn test_remove_deletes_only_that_key() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_last_answers_snapshot() {
        let dir = tempdir().unwrap();
        let store = KvStore::open(dir.path());
        assert!(store.last_answers().unwrap().is_none());

        let answers = vec![Exchange {
            question: "누구한테 선물 줄 거야?".to_string(),
            answer: "여자친구".to_string(),
        }];
        store.set_last_answers(&answers).unwrap();

        let snapshot = store.last_answers().unwrap().unwrap();
        assert_eq!(snapshot.answers, answers);

        assert!(store.clear_last_answers().unwrap());
        assert!(store.last_answers().unwrap().is_none());
    }
}
