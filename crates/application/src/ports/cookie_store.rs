//! Cookie jar port
//!
//! Defines the interface for the browser profile's cookie persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessiongate_domain::{Cookie, CookieJar};

/// Errors that can occur during cookie jar operations.
#[derive(Debug, thiserror::Error)]
pub enum CookieStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository trait for the cookie jar.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Loads the cookie jar. Returns an empty jar if nothing was stored yet.
    async fn load(&self) -> Result<CookieJar, CookieStoreError>;

    /// Saves the cookie jar.
    ///
    /// # Errors
    /// Returns an error if the jar cannot be written.
    async fn save(&self, jar: &CookieJar) -> Result<(), CookieStoreError>;

    /// Finds an unexpired cookie called `name` sent to `host`.
    async fn find_valid(
        &self,
        name: &str,
        host: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Cookie>, CookieStoreError> {
        let jar = self.load().await?;
        Ok(jar.find_valid(name, host, now).cloned())
    }

    /// Adds or replaces a cookie.
    async fn set_cookie(&self, cookie: Cookie, now: DateTime<Utc>) -> Result<(), CookieStoreError> {
        let mut jar = self.load().await?;
        jar.add(cookie, now);
        self.save(&jar).await
    }

    /// Removes every cookie called `name`.
    async fn remove_named(&self, name: &str) -> Result<(), CookieStoreError> {
        let mut jar = self.load().await?;
        jar.remove_named(name);
        self.save(&jar).await
    }

    /// Removes all cookies.
    async fn clear(&self) -> Result<(), CookieStoreError> {
        self.save(&CookieJar::new()).await
    }
}
