use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECIPIENT_EMAIL_KEY: &str = "recipientEmail";
pub const SCHEDULED_TIME_KEY: &str = "scheduledTime";
pub const TASK_HISTORY_KEY: &str = "taskHistory";

/// String key-value store persisted as a single JSON object. Every write goes
/// straight to disk.
pub struct LocalStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl LocalStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(items) => items,
                Err(e) => {
                    log::error!("Ignoring corrupt store at {:?}: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::error!("Failed to read store at {:?}: {}", path, e);
                BTreeMap::new()
            }
        };
        Self { path, items }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.items.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write store: {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("store.json"));
        assert!(store.get_item(RECIPIENT_EMAIL_KEY).is_none());
    }

    #[test]
    fn writes_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = LocalStore::open(&path);
        store.set_item(SCHEDULED_TIME_KEY, "07:15").unwrap();

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.get_item(SCHEDULED_TIME_KEY), Some("07:15"));
    }

    #[test]
    fn remove_item_deletes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = LocalStore::open(&path);
        store.set_item(TASK_HISTORY_KEY, "[]").unwrap();
        store.remove_item(TASK_HISTORY_KEY).unwrap();

        assert!(LocalStore::open(&path).get_item(TASK_HISTORY_KEY).is_none());
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(&path);
        assert!(store.get_item(TASK_HISTORY_KEY).is_none());
    }
}
