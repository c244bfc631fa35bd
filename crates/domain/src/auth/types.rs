//! Access token record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{DomainError, DomainResult};

/// Access token object persisted per application root path.
///
/// Serialized as `{ "access_token": "...", "expiry": "<ISO-8601>", ... }`.
/// Fields other than `access_token` and `expiry` are kept in `extra` so a
/// read/modify/write cycle does not drop what the issuer returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque bearer credential.
    pub access_token: String,
    /// Instant after which the token must not be used.
    pub expiry: DateTime<Utc>,
    /// Any further fields returned by the issuer.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TokenRecord {
    /// Create a record with no extra fields.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expiry,
            extra: BTreeMap::new(),
        }
    }

    /// Attach an extra field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Returns true while `now` is strictly before the expiry.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    /// Check if the token is expired or will expire within the given buffer.
    ///
    /// A buffer reaching past the representable time range counts as expiring.
    #[must_use]
    pub fn is_expired_or_expiring(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        chrono::Duration::try_seconds(buffer_seconds)
            .and_then(|buffer| now.checked_add_signed(buffer))
            .map_or(buffer_seconds > 0, |horizon| horizon >= self.expiry)
    }

    /// Whole seconds until expiry, negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry - now).num_seconds()
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Validates a freshly issued record against the token contract.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidToken`] when the access token is blank or
    /// the record is already expired at `now`.
    pub fn validate_issued(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(DomainError::InvalidToken(
                "issued token has an empty access_token".to_string(),
            ));
        }
        if !self.is_valid_at(now) {
            return Err(DomainError::InvalidToken(format!(
                "issued token expired at {}",
                self.expiry.to_rfc3339()
            )));
        }
        Ok(())
    }

    /// Short, log-safe preview of the access token (first 8 chars + ...).
    #[must_use]
    pub fn preview(&self) -> String {
        token_preview(&self.access_token)
    }
}

/// Get a preview of an access token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}
