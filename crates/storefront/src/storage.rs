//! Durable client-side key-value persistence.
//!
//! The cart and the session each persist a JSON document under a fixed key
//! and restore it at startup (hydration). Persistence is synchronous from the
//! caller's perspective; backends are expected not to block meaningfully.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Storage keys for persisted store state.
pub mod keys {
    /// Key for the persisted cart line items.
    pub const CART: &str = "cart-storage";

    /// Key for the persisted auth session.
    pub const AUTH: &str = "auth-storage";
}

/// Errors that can occur reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage key is not usable as a record name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// A durable key-value store for serialized state.
///
/// Implementations must be safe to share across the stores that persist
/// through them.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one `<key>.json` file per key under a directory.
#[derive(Debug)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are fixed constants, but reject separators anyway so a bad key
        // cannot escape the storage directory.
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash mid-write cannot truncate the record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();

        assert_eq!(storage.load(keys::CART).unwrap(), None);
        storage.save(keys::CART, r#"[{"id":"p1"}]"#).unwrap();
        assert_eq!(
            storage.load(keys::CART).unwrap().as_deref(),
            Some(r#"[{"id":"p1"}]"#)
        );

        storage.remove(keys::CART).unwrap();
        assert_eq!(storage.load(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_file_storage_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();

        storage.save(keys::AUTH, "old").unwrap();
        storage.save(keys::AUTH, "new").unwrap();
        assert_eq!(storage.load(keys::AUTH).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_file_storage_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        storage.remove("never-written").unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        assert!(matches!(
            storage.save("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.save(keys::AUTH, "{}").unwrap();
        assert_eq!(storage.load(keys::AUTH).unwrap().as_deref(), Some("{}"));
        storage.remove(keys::AUTH).unwrap();
        assert_eq!(storage.load(keys::AUTH).unwrap(), None);
    }
}
