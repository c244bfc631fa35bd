//! In-memory local storage and cookie jar.
//!
//! Used for a single navigation context that does not outlive the process,
//! and as the default test double of the storage ports.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sessiongate_domain::CookieJar;
use tokio::sync::RwLock;

use crate::ports::{CookieStore, CookieStoreError, KeyValueStorage, StorageError};

/// Thread-safe in-memory local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.items.write().await.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.read().await.keys().cloned().collect())
    }
}

/// Thread-safe in-memory cookie jar.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    jar: Arc<RwLock<CookieJar>>,
}

impl MemoryCookieStore {
    /// Create an empty cookie jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `jar`.
    #[must_use]
    pub fn with_jar(jar: CookieJar) -> Self {
        Self {
            jar: Arc::new(RwLock::new(jar)),
        }
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn load(&self) -> Result<CookieJar, CookieStoreError> {
        Ok(self.jar.read().await.clone())
    }

    async fn save(&self, jar: &CookieJar) -> Result<(), CookieStoreError> {
        *self.jar.write().await = jar.clone();
        Ok(())
    }
}
