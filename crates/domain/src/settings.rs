//! Session client configuration model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cookie::{ACCOUNT_SESSION_COOKIE, CONSOLE_AUTH_COOKIE};
use crate::{DomainError, DomainResult};

/// Settings of the console session client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Origin serving the console, e.g. `https://tti.example.com`.
    pub console_base_url: Url,
    /// Root path of the console application.
    pub root_path: String,
    /// Origin serving the account app (identity provider).
    pub account_base_url: Url,
    /// Root path of the account app.
    pub account_root_path: String,
    /// OAuth client id of the console.
    pub client_id: String,
    /// Name of the console session cookie.
    pub cookie_name: String,
    /// Name of the account app session cookie on the account origin.
    pub account_cookie_name: String,
    /// Seconds before expiry a token is reported as expiring.
    pub refresh_buffer_seconds: i64,
    /// Timeout of calls to the console backend.
    pub request_timeout_secs: u64,
    /// Directory holding the local storage and cookie files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Largest accepted refresh buffer (one day).
pub const MAX_REFRESH_BUFFER_SECONDS: i64 = 86_400;

fn default_origin() -> Url {
    Url::parse("http://localhost:1885").unwrap_or_else(|_| unreachable!("static URL is valid"))
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            console_base_url: default_origin(),
            root_path: "/console".to_string(),
            account_base_url: default_origin(),
            account_root_path: "/oauth".to_string(),
            client_id: "console".to_string(),
            cookie_name: CONSOLE_AUTH_COOKIE.to_string(),
            account_cookie_name: ACCOUNT_SESSION_COOKIE.to_string(),
            refresh_buffer_seconds: 60,
            request_timeout_secs: 10,
            data_dir: None,
        }
    }
}

impl SessionConfig {
    /// Checks the invariants the session guard relies on.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPath`] for root paths that are not
    /// absolute, [`DomainError::InvalidUrl`] for origins that cannot carry
    /// a path and [`DomainError::InvalidConfig`] for blank cookie names or a
    /// refresh buffer outside `0..=MAX_REFRESH_BUFFER_SECONDS`.
    pub fn validate(&self) -> DomainResult<()> {
        for path in [&self.root_path, &self.account_root_path] {
            if !path.starts_with('/') {
                return Err(DomainError::InvalidPath(format!(
                    "root path must be absolute: {path}"
                )));
            }
        }
        for url in [&self.console_base_url, &self.account_base_url] {
            if url.cannot_be_a_base() || url.host_str().is_none() {
                return Err(DomainError::InvalidUrl(url.to_string()));
            }
        }
        if self.cookie_name.trim().is_empty() || self.account_cookie_name.trim().is_empty() {
            return Err(DomainError::InvalidConfig(
                "cookie name must not be empty".to_string(),
            ));
        }
        if !(0..=MAX_REFRESH_BUFFER_SECONDS).contains(&self.refresh_buffer_seconds) {
            return Err(DomainError::InvalidConfig(format!(
                "refresh buffer must be between 0 and {MAX_REFRESH_BUFFER_SECONDS} seconds, got {}",
                self.refresh_buffer_seconds
            )));
        }
        Ok(())
    }

    /// Root path without a trailing slash (`/` stays `/`).
    #[must_use]
    pub fn normalized_root(&self) -> &str {
        let trimmed = self.root_path.trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    }

    /// Host the session cookie must be scoped to.
    #[must_use]
    pub fn console_host(&self) -> &str {
        self.console_base_url.host_str().unwrap_or_default()
    }

    /// Host the account app session cookie is scoped to.
    #[must_use]
    pub fn account_host(&self) -> &str {
        self.account_base_url.host_str().unwrap_or_default()
    }

    /// Absolute console URL for a path under the console origin.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the path cannot be joined.
    pub fn console_url(&self, path: &str) -> DomainResult<Url> {
        self.console_base_url
            .join(path)
            .map_err(|e| DomainError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Endpoint returning a fresh token for a valid session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the URL cannot be built.
    pub fn token_endpoint(&self) -> DomainResult<Url> {
        self.console_url(&format!("{}/api/auth/token", self.root_prefix()))
    }

    /// Console callback receiving the authorization code.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the URL cannot be built.
    pub fn callback_url(&self) -> DomainResult<Url> {
        self.console_url(&format!("{}/oauth/callback", self.root_prefix()))
    }

    fn root_prefix(&self) -> &str {
        self.root_path.trim_end_matches('/')
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.root_path, "/console");
        assert_eq!(config.cookie_name, "_console_auth");
        assert_eq!(config.account_cookie_name, "_session");
        assert_eq!(config.console_host(), "localhost");
    }

    #[test]
    fn test_endpoints() {
        let config = SessionConfig {
            console_base_url: Url::parse("https://tti.example.com").unwrap(),
            root_path: "/console/".to_string(),
            ..SessionConfig::default()
        };
        assert_eq!(config.normalized_root(), "/console");
        assert_eq!(
            config.token_endpoint().unwrap().as_str(),
            "https://tti.example.com/console/api/auth/token"
        );
        assert_eq!(
            config.callback_url().unwrap().as_str(),
            "https://tti.example.com/console/oauth/callback"
        );
    }

    #[test]
    fn test_relative_root_is_rejected() {
        let config = SessionConfig {
            root_path: "console".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(DomainError::InvalidPath(_))));
    }

    #[test]
    fn test_refresh_buffer_is_range_checked() {
        for buffer in [-1, MAX_REFRESH_BUFFER_SECONDS + 1, i64::MAX, i64::MIN] {
            let config = SessionConfig {
                refresh_buffer_seconds: buffer,
                ..SessionConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(DomainError::InvalidConfig(_))),
                "buffer {buffer} accepted"
            );
        }
        let config = SessionConfig {
            refresh_buffer_seconds: MAX_REFRESH_BUFFER_SECONDS,
            ..SessionConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"root_path":"/tenant/console"}"#).unwrap();
        assert_eq!(config.root_path, "/tenant/console");
        assert_eq!(config.account_root_path, "/oauth");
    }
}
