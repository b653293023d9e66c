//! Flat key/value preference store
//!
//! Open once per attach, pass it explicitly to whatever mutates it. Every
//! mutation is flushed to disk before returning.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed preference store: {0}")]
    Json(#[from] serde_json::Error),
}

/// String preferences persisted as one JSON object
#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            tracing::debug!("No preference store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `key` and flush
    pub fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.get(key) == Some(value) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    /// Remove `key` and flush
    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the whole store, replacing the file atomically
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.values)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;

        tracing::trace!("Preference store flushed to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let mut store = PreferenceStore::in_memory();
        assert!(store.get("touchscreen_mode_preference").is_none());

        store.put("touchscreen_mode_preference", "finger").unwrap();
        assert_eq!(store.get("touchscreen_mode_preference"), Some("finger"));
        assert!(store.path().is_none());

        store.remove("touchscreen_mode_preference").unwrap();
        assert!(store.get("touchscreen_mode_preference").is_none());
    }

    #[test]
    fn test_put_flushes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let mut store = PreferenceStore::open(&path).unwrap();
        store.put("rotation_mode_preference", "90").unwrap();
        assert!(path.exists());

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("rotation_mode_preference"), Some("90"));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "").unwrap();

        let store = PreferenceStore::open(&path).unwrap();
        assert_eq!(store.entries().count(), 0);
    }

    #[test]
    fn test_open_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(PreferenceStore::open(&path), Err(StoreError::Json(_))));
    }
}
