//! Key-value persistence for the core's collections.
//!
//! Each collection is written as one serialized JSON blob under its own key.
//! Reads never fail from the caller's point of view: a missing key and a
//! corrupt blob both come back as `None`, the latter with a warning, so the
//! owning collection starts empty instead of refusing to load.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value for {key} is corrupt: {reason}")]
    StorageCorrupt { key: String, reason: String },
}

/// Raw string storage under named keys.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, used for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing serialization.
    pub fn with_raw(self, key: &str, value: &str) -> Self {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Write-to-temp-then-rename so a crash mid-write leaves the old blob intact.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let temp = path.with_extension("json.tmp");
        let to_err = |source| StoreError::Write {
            key: key.to_string(),
            source,
        };
        fs::write(&temp, value).map_err(to_err)?;
        fs::rename(&temp, &path).map_err(to_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Typed JSON adapter over a [`KeyValueStore`] that never surfaces errors.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Rc<dyn KeyValueStore>,
}

impl PersistentStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()))
    }

    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        Ok(Self::new(Rc::new(JsonFileStore::open(dir)?)))
    }

    /// Serialize and write `value`. Returns whether it was persisted;
    /// failures are logged and otherwise ignored.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => {
                tracing::trace!("store: saved {}", key);
                true
            }
            Err(e) => {
                tracing::warn!("store: {}", e);
                false
            }
        }
    }

    /// Read and deserialize `key`. `None` when missing or corrupt.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("store: {} (starting from empty state)", e);
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("store: {}", e);
                false
            }
        }
    }

    fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, &json)
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::StorageCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Backend whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn write(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_memory_roundtrip() {
        let store = PersistentStore::in_memory();
        assert!(store.save("numbers", &vec![1, 2, 3]));
        assert_eq!(store.load::<Vec<u32>>("numbers"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_missing_key_loads_none() {
        let store = PersistentStore::in_memory();
        assert_eq!(store.load::<Vec<u32>>("absent"), None);
    }

    #[test]
    fn test_corrupt_blob_loads_none() {
        let backend = MemoryStore::new().with_raw("numbers", "[1, 2,");
        let store = PersistentStore::new(Rc::new(backend));
        assert_eq!(store.load::<Vec<u32>>("numbers"), None);
    }

    #[test]
    fn test_wrong_shape_loads_none() {
        let backend = MemoryStore::new().with_raw("numbers", r#"{"not": "a list"}"#);
        let store = PersistentStore::new(Rc::new(backend));
        assert_eq!(store.load::<Vec<u32>>("numbers"), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let store = PersistentStore::new(Rc::new(ReadOnlyStore));
        assert!(!store.save("numbers", &vec![1]));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = PersistentStore::open_dir(dir.path()).unwrap();
        assert!(store.save("conversations", &vec!["a", "b"]));
        assert!(dir.path().join("conversations.json").exists());
        assert!(!dir.path().join("conversations.json.tmp").exists());

        let reopened = PersistentStore::open_dir(dir.path()).unwrap();
        assert_eq!(
            reopened.load::<Vec<String>>("conversations"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_file_store_corrupt_file_loads_none() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notifications_ledger.json"), "garbage").unwrap();
        let store = PersistentStore::open_dir(dir.path()).unwrap();
        assert_eq!(store.load::<Vec<String>>("notifications_ledger"), None);
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        let backend = JsonFileStore::open(dir.path()).unwrap();
        assert!(backend.remove("never_written").is_ok());
        assert_eq!(backend.read("never_written").unwrap(), None);
    }
}
