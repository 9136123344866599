//! Key-value persistence for local state (credits, progress).
//!
//! Writers are not coordinated across processes: the last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{StudioError, StudioResult};

/// String-keyed storage of string values.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Storage`] if the backend cannot be read.
    fn get(&self, key: &str) -> StudioResult<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Storage`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> StudioResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Storage`] if the backend cannot be written.
    fn remove(&self, key: &str) -> StudioResult<()>;
}

/// Read and deserialize a JSON value.
///
/// # Errors
///
/// Returns an error if the store fails or the value is not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StudioResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value.
///
/// # Errors
///
/// Returns an error if serialization or the store fails.
pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> StudioResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StudioResult<Option<String>> {
        let values = self
            .values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StudioResult<()> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StudioResult<()> {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Storage`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> StudioResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::debug!(dir = %data_dir.display(), "file store opened");
        Ok(Self { data_dir })
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StudioResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StudioError::Storage(format!("failed to read {key}: {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> StudioResult<()> {
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .map_err(|e| StudioError::Storage(format!("failed to write {}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> StudioResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StudioError::Storage(format!("failed to remove {key}: {e}"))),
        }
    }
}

/// Replace any character that is not alphanumeric, `-` or `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").expect("get").is_none());
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));

        let shared = store.clone();
        shared.remove("k").expect("remove");
        assert!(store.is_empty());
        shared.remove("k").expect("remove missing");
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path().join("nested")).expect("open");
        store.set("yt_pro_studio_credits", "7").expect("set");

        let reopened = FileStore::open(dir.path().join("nested")).expect("reopen");
        assert_eq!(
            reopened.get("yt_pro_studio_credits").expect("get").as_deref(),
            Some("7")
        );
        reopened.remove("yt_pro_studio_credits").expect("remove");
        assert!(store.get("yt_pro_studio_credits").expect("get").is_none());
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        write_json(&store, "numbers", &vec![1, 2, 3]).expect("write");
        let numbers: Option<Vec<u32>> = read_json(&store, "numbers").expect("read");
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        store.set("broken", "{").expect("set");
        let broken: StudioResult<Option<Vec<u32>>> = read_json(&store, "broken");
        assert!(matches!(broken, Err(StudioError::Serialization(_))));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("simple"), "simple");
        assert_eq!(sanitize_filename("with-dash_and_underscore"), "with-dash_and_underscore");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename("a b:c"), "a_b_c");
    }
}
