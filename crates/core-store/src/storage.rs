//! Key-value persistence boundary.
//!
//! The store persists the whole placement array as one JSON value under a
//! single fixed key, so the backend contract is deliberately tiny: read a
//! string, write a string. `FileStorage` maps each key to a file under a root
//! directory via `tokio::fs`; `MemoryStorage` backs tests and previews.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous key-value storage. Implementations must be safe to share
/// across tasks; the store serializes its own read-modify-write cycles.
#[async_trait]
pub trait WidgetStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key under `root`, created on first write.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl WidgetStorage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral previews.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the store (corrupt-input tests).
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("storage map poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl WidgetStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .expect("storage map poisoned")
            .get(key)
            .cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("storage map poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.read("missing").await.unwrap().is_none());
        storage.write("k", "[1,2,3]").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[tokio::test]
    async fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.read("k").await.unwrap().is_none());
        storage.write("k", "v").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("v"));
    }
}
