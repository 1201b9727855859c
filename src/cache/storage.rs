//! Key-value storage backends for the response cache and favorites
//!
//! Provides a small string-to-string storage trait modelled on browser
//! web storage, with an in-memory backend and a directory-backed backend
//! that keeps one JSON file per key.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

/// File extension used for entries written by [`FileStorage`]
const ENTRY_EXTENSION: &str = ".json";

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying files failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the storage quota
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Storage is disabled or otherwise unusable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store
///
/// All operations may fail; callers decide whether a failure matters.
pub trait KvStorage: Send + Sync {
    /// Returns the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S: KvStorage + ?Sized> KvStorage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// In-memory storage, optionally bounded by a byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    /// Creates an empty, unbounded storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that rejects writes once keys plus values exceed `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Creates a storage whose every operation fails with [`StorageError::Unavailable`]
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl KvStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;

        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// On-disk form of a [`FileStorage`] entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    key: String,
    value: String,
}

/// Directory-backed storage
///
/// Each key is stored in its own file named after the SHA-256 of the key, so
/// file names stay short whatever the key holds. The file keeps the full key
/// next to the value, which is how [`KvStorage::keys`] recovers it
/// (`~/.cache/moviex/` on Linux for the response cache). The directory is
/// created on the first write, and a missing directory reads as empty.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the directory entries are stored in
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Returns the path of the file backing `key`
    fn item_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(format!("{}{}", hex::encode(digest), ENTRY_EXTENSION))
    }

    /// Reads the entry at `path`, `None` when missing or not ours
    fn read_item(path: &Path) -> Result<Option<StoredItem>, StorageError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable storage file");
                Ok(None)
            }
        }
    }
}

impl KvStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let item = Self::read_item(&self.item_path(key))?;
        Ok(item.filter(|item| item.key == key).map(|item| item.value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let item = StoredItem {
            key: key.to_string(),
            value: value.to_string(),
        };
        let json = serde_json::to_string(&item)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        fs::write(self.item_path(key), json)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(ENTRY_EXTENSION));
            if !is_entry {
                continue;
            }
            if let Some(item) = Self::read_item(&path)? {
                keys.push(item.key);
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_file_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::new(temp_dir.path().join("store"));
        (storage, temp_dir)
    }

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));

        storage.remove_item("a").unwrap();
        assert!(storage.get_item("a").unwrap().is_none());

        // Removing again is fine
        storage.remove_item("a").unwrap();
    }

    #[test]
    fn test_memory_storage_keys() {
        let storage = MemoryStorage::new();
        storage.set_item("x", "1").unwrap();
        storage.set_item("y", "2").unwrap();

        let mut keys = storage.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_memory_storage_quota_exceeded() {
        let storage = MemoryStorage::with_quota(10);

        storage.set_item("k", "12345").unwrap();
        let err = storage.set_item("other", "123456789").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 10, .. }));

        // The rejected write leaves existing data alone
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("12345"));
        assert!(storage.get_item("other").unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_quota_counts_replacement_once() {
        let storage = MemoryStorage::with_quota(6);
        storage.set_item("k", "12345").unwrap();
        storage.set_item("k", "54321").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("54321"));
    }

    #[test]
    fn test_disabled_storage_fails_every_operation() {
        let storage = MemoryStorage::disabled();
        assert!(matches!(storage.get_item("a"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.set_item("a", "1"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.remove_item("a"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.keys(), Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_file_storage_missing_directory_reads_empty() {
        let (storage, _temp_dir) = create_file_storage();
        assert!(storage.get_item("missing").unwrap().is_none());
        assert!(storage.keys().unwrap().is_empty());
        storage.remove_item("missing").unwrap();
    }

    #[test]
    fn test_file_storage_creates_directory_on_write() {
        let (storage, _temp_dir) = create_file_storage();
        storage.set_item("key", "value").unwrap();
        assert!(storage.dir().exists(), "Storage directory should be created");
        assert_eq!(storage.get_item("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_file_storage_keys_roundtrip() {
        let (storage, _temp_dir) = create_file_storage();
        let key = "moviex_cache_v1:/movie/popular?language=en-US&page=1";

        storage.set_item(key, "{}").unwrap();

        assert_eq!(storage.keys().unwrap(), vec![key.to_string()]);
        assert_eq!(storage.get_item(key).unwrap().as_deref(), Some("{}"));

        storage.remove_item(key).unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_storage_ignores_foreign_files() {
        let (storage, _temp_dir) = create_file_storage();
        storage.set_item("ours", "1").unwrap();
        fs::write(storage.dir().join("README.txt"), "not an entry").unwrap();
        fs::write(storage.dir().join("settings.json"), "[1, 2]").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["ours".to_string()]);
    }

    #[test]
    fn test_file_storage_long_key_roundtrip() {
        let (storage, _temp_dir) = create_file_storage();
        let query = urlencoding::encode("風の谷のナウシカ 天空の城ラピュタ となりのトトロ 千と千尋の神隠し");
        let key = format!(
            "moviex_cache_v1:/search/movie?include_adult=false&language=en-US&page=1&query={}",
            query
        );
        assert!(key.len() > 255, "Key should exceed a file name limit");

        storage.set_item(&key, "{\"ts\":1}").unwrap();

        assert_eq!(storage.get_item(&key).unwrap().as_deref(), Some("{\"ts\":1}"));
        assert_eq!(storage.keys().unwrap(), vec![key.clone()]);
        for entry in fs::read_dir(storage.dir()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(name.len() < 100, "File name should stay short");
        }

        storage.remove_item(&key).unwrap();
        assert!(storage.get_item(&key).unwrap().is_none());
    }
}
