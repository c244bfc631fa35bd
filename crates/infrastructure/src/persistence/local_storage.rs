//! File-based local storage.
//!
//! The whole local storage of the console origin lives in one file:
//! ```json
//! {
//!   "items": {
//!     "accessToken-1259217480": "{\"access_token\":\"...\",\"expiry\":\"...\"}"
//!   },
//!   "schema_version": 1
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sessiongate_application::ports::{FileSystem, KeyValueStorage, StorageError};
use tokio::sync::Mutex;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

/// File name of the local storage inside a profile directory.
pub const LOCAL_STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug, Serialize, Deserialize)]
struct LocalStorageFile {
    schema_version: u32,
    #[serde(default)]
    items: BTreeMap<String, String>,
}

impl Default for LocalStorageFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            items: BTreeMap::new(),
        }
    }
}

/// Local storage persisted as a JSON file.
#[derive(Debug)]
pub struct FileStorage<F> {
    fs: F,
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl<F: FileSystem> FileStorage<F> {
    /// Creates a local storage inside `profile_dir`.
    pub fn new(fs: F, profile_dir: &Path) -> Self {
        Self {
            fs,
            path: profile_dir.join(LOCAL_STORAGE_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<LocalStorageFile, StorageError> {
        if !self.fs.exists(&self.path).await {
            return Ok(LocalStorageFile::default());
        }
        let content = self
            .fs
            .read_file(&self.path)
            .await
            .map_err(|e| StorageError::Io(e.into()))?;
        let file: LocalStorageFile =
            from_json_bytes(&content).map_err(|e| StorageError::Serialization(e.to_string()))?;
        if file.schema_version > SCHEMA_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported local storage schema version {}",
                file.schema_version
            )));
        }
        Ok(file)
    }

    async fn save(&self, file: &LocalStorageFile) -> Result<(), StorageError> {
        let content =
            to_json_stable_bytes(file).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.fs
            .write_file(&self.path, &content)
            .await
            .map_err(|e| StorageError::Io(e.into()))
    }

    async fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) + Send,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        apply(&mut file.items);
        file.schema_version = SCHEMA_VERSION;
        self.save(&file).await
    }
}

#[async_trait]
impl<F: FileSystem> KeyValueStorage for FileStorage<F> {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.items.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
        .await?;
        debug!(key, path = %self.path.display(), "local storage item written");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.remove(key);
        })
        .await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.update(BTreeMap::clear).await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.items.into_keys().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::TokioFileSystem;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_items_survive_reopen() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(TokioFileSystem::new(), dir.path());
        storage.set_item("accessToken-1", "{\"a\":1}").await.unwrap();
        storage.set_item("other", "x").await.unwrap();

        let reopened = FileStorage::new(TokioFileSystem::new(), dir.path());
        assert_eq!(
            reopened.get_item("accessToken-1").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(reopened.keys().await.unwrap(), vec!["accessToken-1", "other"]);

        let raw = std::fs::read_to_string(dir.path().join(LOCAL_STORAGE_FILE)).unwrap();
        assert!(raw.contains("\"schema_version\": 1"));
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(TokioFileSystem::new(), dir.path());
        assert!(storage.get_item("anything").await.unwrap().is_none());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(TokioFileSystem::new(), dir.path());
        storage.set_item("a", "1").await.unwrap();
        storage.set_item("b", "2").await.unwrap();

        storage.remove_item("a").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["b"]);

        storage.clear().await.unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(LOCAL_STORAGE_FILE), "{oops").unwrap();
        let storage = FileStorage::new(TokioFileSystem::new(), dir.path());
        assert!(matches!(
            storage.get_item("a").await,
            Err(StorageError::Serialization(_))
        ));
    }
}
