//! Typed access token record on top of local storage.
//!
//! The record lives under `accessToken-<hash(root_path)>` as JSON. A record
//! that cannot be decoded is reported as absent so the guard re-obtains one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sessiongate_domain::{StorageKey, TokenRecord};
use tracing::{debug, warn};

use crate::SessionResult;
use crate::ports::{KeyValueStorage, StorageError};

/// Access token record of one console root path.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    key: StorageKey,
    /// Seconds before expiry a token is reported as expiring.
    refresh_buffer_seconds: i64,
}

impl TokenStore {
    /// Create a token store for `root_path` with default settings.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, root_path: &str) -> Self {
        Self {
            storage,
            key: StorageKey::access_token(root_path),
            refresh_buffer_seconds: 60,
        }
    }

    /// Create with custom refresh buffer.
    #[must_use]
    pub const fn with_refresh_buffer(mut self, refresh_buffer_seconds: i64) -> Self {
        self.refresh_buffer_seconds = refresh_buffer_seconds;
        self
    }

    /// Storage key of the record.
    #[must_use]
    pub const fn key(&self) -> &StorageKey {
        &self.key
    }

    /// Store a token, overwriting the previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub async fn store(&self, token: &TokenRecord) -> SessionResult<()> {
        let value = serde_json::to_string(token)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set_item(self.key.as_str(), &value).await?;
        debug!(key = %self.key, token = %token.preview(), "stored access token");
        Ok(())
    }

    /// Get the stored token, valid or not.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be read.
    pub async fn get(&self) -> SessionResult<Option<TokenRecord>> {
        let Some(raw) = self.storage.get_item(self.key.as_str()).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<TokenRecord>(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "ignoring undecodable token record");
                Ok(None)
            }
        }
    }

    /// Get a token that is still valid at `now`, or None if expired/missing.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be read.
    pub async fn get_valid(&self, now: DateTime<Utc>) -> SessionResult<Option<TokenRecord>> {
        Ok(self.get().await?.filter(|t| t.is_valid_at(now)))
    }

    /// Remove the record.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be written.
    pub async fn remove(&self) -> SessionResult<()> {
        self.storage.remove_item(self.key.as_str()).await?;
        Ok(())
    }

    /// Get token status for display.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be read.
    pub async fn get_status(&self, now: DateTime<Utc>) -> SessionResult<TokenStatus> {
        Ok(self.get().await?.map_or(TokenStatus::NotAuthenticated, |token| {
            if !token.is_valid_at(now) {
                TokenStatus::Expired
            } else if token.is_expired_or_expiring(now, self.refresh_buffer_seconds) {
                TokenStatus::Expiring {
                    seconds_remaining: token.seconds_until_expiry(now),
                }
            } else {
                TokenStatus::Valid {
                    seconds_remaining: token.seconds_until_expiry(now),
                }
            }
        }))
    }
}

/// Status of the stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No (decodable) token is stored.
    NotAuthenticated,
    /// Token is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is valid but will expire within the refresh buffer.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token has expired; the next page load re-obtains one.
    Expired,
}

impl TokenStatus {
    /// Returns true if the token is valid (not expired).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring { seconds_remaining } => {
                format!("Expiring in {seconds_remaining} seconds")
            }
            Self::Expired => "Expired (refreshed on next load)".to_string(),
        }
    }
}
