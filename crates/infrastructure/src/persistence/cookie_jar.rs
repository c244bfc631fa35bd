//! File-based cookie jar.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessiongate_application::ports::{Clock, CookieStore, CookieStoreError, FileSystem};
use sessiongate_domain::{Cookie, CookieJar};
use tokio::sync::Mutex;
use tracing::debug;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name of the cookie jar inside a profile directory.
pub const COOKIES_FILE: &str = "cookies.json";

/// Cookie jar persisted as a JSON file.
///
/// Cookies expired at the injected clock's time are dropped whenever the jar
/// is written. Read-modify-write operations hold the jar lock throughout.
pub struct FileCookieStore<F> {
    fs: F,
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl<F: FileSystem> FileCookieStore<F> {
    /// Creates a cookie jar inside `profile_dir`.
    pub fn new(fs: F, profile_dir: &Path, clock: Arc<dyn Clock>) -> Self {
        Self {
            fs,
            path: profile_dir.join(COOKIES_FILE),
            clock,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_jar(&self) -> Result<CookieJar, CookieStoreError> {
        if !self.fs.exists(&self.path).await {
            return Ok(CookieJar::new());
        }
        let content = self
            .fs
            .read_file(&self.path)
            .await
            .map_err(|e| CookieStoreError::Io(e.into()))?;
        from_json_bytes(&content).map_err(|e| CookieStoreError::Serialization(e.to_string()))
    }

    async fn write_jar(&self, mut jar: CookieJar) -> Result<(), CookieStoreError> {
        jar.cleanup_expired(self.clock.now());
        let content =
            to_json_stable_bytes(&jar).map_err(|e| CookieStoreError::Serialization(e.to_string()))?;
        self.fs
            .write_file(&self.path, &content)
            .await
            .map_err(|e| CookieStoreError::Io(e.into()))?;
        debug!(cookies = jar.len(), path = %self.path.display(), "cookie jar saved");
        Ok(())
    }

    async fn update(
        &self,
        apply: impl FnOnce(&mut CookieJar) + Send,
    ) -> Result<(), CookieStoreError> {
        let _guard = self.lock.lock().await;
        let mut jar = self.read_jar().await?;
        apply(&mut jar);
        self.write_jar(jar).await
    }
}

#[async_trait]
impl<F: FileSystem> CookieStore for FileCookieStore<F> {
    async fn load(&self) -> Result<CookieJar, CookieStoreError> {
        let _guard = self.lock.lock().await;
        self.read_jar().await
    }

    async fn save(&self, jar: &CookieJar) -> Result<(), CookieStoreError> {
        let _guard = self.lock.lock().await;
        self.write_jar(jar.clone()).await
    }

    async fn set_cookie(&self, cookie: Cookie, now: DateTime<Utc>) -> Result<(), CookieStoreError> {
        self.update(|jar| jar.add(cookie, now)).await
    }

    async fn remove_named(&self, name: &str) -> Result<(), CookieStoreError> {
        self.update(|jar| jar.remove_named(name)).await
    }
}
