//! Local storage port

use async_trait::async_trait;

/// Errors raised by a key-value storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key-value store with browser local storage semantics.
///
/// Values are opaque strings; callers own the encoding.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Removes every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Lists all keys in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}
