//! JSON-file state store.
//!
//! The file holds one JSON object mapping storage keys to `"on"` / `"off"`,
//! mirroring the extension storage area it stands in for:
//!
//! ```json
//! { "t3SearchManualState": "on" }
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the original,
//! so a crash mid-write never leaves a truncated file behind.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::errors::{DomainResult, ToggleError};
use crate::domain::models::DesiredState;
use crate::domain::ports::StateStore;

pub struct JsonFileStateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All raw entries in the file; empty when the file does not exist yet.
    pub async fn entries(&self) -> DomainResult<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(ToggleError::PersistenceFailure(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|err| {
            ToggleError::PersistenceFailure(format!(
                "failed to parse {}: {err}",
                self.path.display()
            ))
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> DomainResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), entries = entries.len(), "state file written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self, key: &str) -> DomainResult<Option<DesiredState>> {
        let entries = self.entries().await?;
        let Some(raw) = entries.get(key) else {
            return Ok(None);
        };
        raw.parse().map(Some).map_err(|_| ToggleError::InvalidStoredValue {
            key: key.to_string(),
            value: raw.clone(),
        })
    }

    async fn set(&self, key: &str, state: DesiredState) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.entries().await?;
        entries.insert(key.to_string(), state.as_str().to_string());
        self.write_entries(&entries).await
    }

    async fn clear(&self, key: &str) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_creates_parent_dirs_and_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/state.json");

        let store = JsonFileStateStore::new(&path);
        store.set("k", DesiredState::On).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_file_name("state.json.tmp").exists());

        let reopened = JsonFileStateStore::new(&path);
        assert_eq!(reopened.get("k").await.unwrap(), Some(DesiredState::On));

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get("k").map(String::as_str), Some("on"));
    }

    #[tokio::test]
    async fn test_other_keys_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"other": "value"}"#).unwrap();

        let store = JsonFileStateStore::new(&path);
        store.set("k", DesiredState::Off).await.unwrap();
        store.clear("missing").await.unwrap();

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.get("other").map(String::as_str), Some("value"));
        assert_eq!(entries.get("k").map(String::as_str), Some("off"));

        store.clear("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_persistence_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStateStore::new(&path);
        assert!(matches!(store.get("k").await, Err(ToggleError::PersistenceFailure(_))));
    }

    #[tokio::test]
    async fn test_invalid_value_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"k": "enabled"}"#).unwrap();

        let store = JsonFileStateStore::new(&path);
        assert!(matches!(
            store.get("k").await,
            Err(ToggleError::InvalidStoredValue { .. })
        ));
    }
}
