//! Console backend token issuer over HTTP.
//!
//! Redirects are never followed: the callback answers with a redirect that
//! carries the new session in `Set-Cookie`, and that header is what matters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use sessiongate_application::ports::{Clock, IssuerError, TokenIssuer};
use sessiongate_domain::{Cookie, CookieJar, SessionConfig, TokenRecord};
use tracing::debug;
use url::Url;

use crate::config::ConfigError;

/// Token issuer talking to the console backend.
pub struct HttpTokenIssuer {
    client: reqwest::Client,
    token_endpoint: Url,
    callback_url: Url,
    console_host: String,
    cookie_name: String,
    clock: Arc<dyn Clock>,
}

impl HttpTokenIssuer {
    /// Creates an issuer for the console described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints cannot be built or the HTTP client
    /// cannot be created.
    pub fn new(config: &SessionConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            token_endpoint: config.token_endpoint()?,
            callback_url: config.callback_url()?,
            console_host: config.console_host().to_string(),
            cookie_name: config.cookie_name.clone(),
            clock,
        })
    }

    /// Endpoint queried for new tokens.
    #[must_use]
    pub const fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }
}

/// Maps a non-success status to the issuer error it stands for.
pub(super) fn status_error(status: StatusCode, body: String) -> IssuerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IssuerError::SessionRejected {
            status: status.as_u16(),
        },
        _ => IssuerError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        },
    }
}

fn network_error(e: &reqwest::Error) -> IssuerError {
    IssuerError::Network(e.to_string())
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    async fn issue_token(&self, session: &Cookie) -> Result<TokenRecord, IssuerError> {
        debug!(endpoint = %self.token_endpoint, "requesting access token");
        let response = self
            .client
            .get(self.token_endpoint.clone())
            .header(COOKIE, session.to_cookie_header())
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let token: TokenRecord = response
            .json()
            .await
            .map_err(|e| IssuerError::InvalidResponse(format!("token payload: {e}")))?;
        debug!(token = %token.preview(), "access token issued");
        Ok(token)
    }

    async fn exchange_code(&self, code: &str, state: &str) -> Result<Cookie, IssuerError> {
        let mut url = self.callback_url.clone();
        url.query_pairs_mut()
            .append_pair("code", code)
            .append_pair("state", state);

        debug!(endpoint = %self.callback_url, "exchanging authorization code");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| (SET_COOKIE.as_str().to_string(), v.to_string()))
            .collect();

        let now = self.clock.now();
        let mut jar = CookieJar::new();
        jar.process_set_cookies(&headers, &self.console_host, now);
        jar.find_valid(&self.cookie_name, &self.console_host, now)
            .cloned()
            .ok_or_else(|| {
                IssuerError::InvalidResponse(format!(
                    "callback did not set the {} cookie",
                    self.cookie_name
                ))
            })
    }
}
