//! Persistent key/value storage for client-side state.
//!
//! One storage file is one storage origin: every key written through a
//! [`FileStorage`] lands in the same `storage.json` and survives restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ChatError;

const STORAGE_FILE: &str = "storage.json";

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ChatError>;
}

/// JSON-file backed storage rooted in a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn open(data_dir: &Path) -> Result<Self, ChatError> {
        fs::create_dir_all(data_dir).map_err(|e| ChatError::storage(data_dir, e))?;
        Ok(Self {
            path: data_dir.join(STORAGE_FILE),
        })
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ChatError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| ChatError::storage(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| ChatError::storage(&self.path, e))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());

        let content = serde_json::to_string_pretty(&entries).map_err(|e| ChatError::storage(&self.path, e))?;
        fs::write(&self.path, content).map_err(|e| ChatError::storage(&self.path, e))
    }
}

/// Storage that lives only as long as the process
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ChatError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("user_id").unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.set("user_id", "abc-123").unwrap();

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("user_id").unwrap().as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.set("theme", "dark").unwrap();
        storage.set("user_id", "abc-123").unwrap();

        assert_eq!(storage.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORAGE_FILE), "not json").unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        let err = storage.get("user_id").unwrap_err();
        assert!(matches!(err, ChatError::StorageUnavailable { .. }));
    }

    #[test]
    fn test_file_storage_unusable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        // A regular file where the data directory should be
        let err = FileStorage::open(&blocker.join("data")).unwrap_err();
        assert!(matches!(err, ChatError::StorageUnavailable { .. }));
    }
}
