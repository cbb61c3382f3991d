// SPDX-License-Identifier: MPL-2.0

//! Persistent key-value slots
//!
//! Each key holds one string document. [`FileStore`] keeps one file per key
//! and replaces it atomically on every write; [`MemoryStore`] keeps
//! everything in-process.

pub mod photos;

pub use photos::{Photo, PhotoStore};

use crate::constants::storage::{SLOT_EXTENSION, TEMP_SUFFIX};
use crate::errors::StorageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// String slots addressed by key
pub trait KeyValueStore: Send {
    /// Read a slot, `None` when it was never written
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the slot's content
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot. Removing a missing slot is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Slots stored as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{SLOT_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let temp = path.with_extension(format!("{SLOT_EXTENSION}.{TEMP_SUFFIX}"));

        // Rename is atomic within a directory, readers never see a partial slot
        std::fs::write(&temp, value)?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }

        debug!(key, bytes = value.len(), "Slot written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store
///
/// Clones share the same slots, so a test can keep a handle and inspect
/// what a [`PhotoStore`] persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("mini-gallery-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn file_store_round_trips_slots() {
        let dir = temp_dir();
        let mut store = FileStore::open(&dir).unwrap();

        assert_eq!(store.get("photos").unwrap(), None);
        store.set("photos", "[]").unwrap();
        assert_eq!(store.get("photos").unwrap().as_deref(), Some("[]"));
        assert!(dir.join("photos.json").exists());
        assert!(!dir.join("photos.json.tmp").exists());

        store.remove("photos").unwrap();
        store.remove("photos").unwrap();
        assert_eq!(store.get("photos").unwrap(), None);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = temp_dir();
        let mut store = FileStore::open(&dir).unwrap();

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn memory_store_clones_share_slots() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.set("photos", "[\"a\"]").unwrap();
        assert_eq!(observer.get("photos").unwrap().as_deref(), Some("[\"a\"]"));
    }
}
