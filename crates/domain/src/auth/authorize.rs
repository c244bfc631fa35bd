//! Authorization-code request sent to the identity provider.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded;

use crate::{DomainError, DomainResult};

/// Query parameter of the login page that carries the authorize request.
pub const LOGIN_NEXT_PARAM: &str = "n";

/// Opaque `state` round-tripped through the login flow.
///
/// `next` is the path the browser originally asked for, so the callback can
/// land there instead of on the root page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// Random value binding the callback to this browser.
    pub nonce: String,
    /// Originally requested path.
    pub next: String,
}

impl AuthorizationState {
    /// Create a new state.
    #[must_use]
    pub fn new(nonce: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            next: next.into(),
        }
    }

    /// Encodes the state as URL-safe base64 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] if the state cannot be serialized.
    pub fn encode(&self) -> DomainResult<String> {
        let json =
            serde_json::to_vec(self).map_err(|e| DomainError::InvalidState(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes a `state` query value produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidState`] for anything that is not an
    /// encoded state.
    pub fn decode(encoded: &str) -> DomainResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| DomainError::InvalidState(format!("not base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| DomainError::InvalidState(e.to_string()))
    }
}

/// An `OAuth2` authorization-code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Client identifier of the console.
    pub client_id: String,
    /// Console callback receiving the authorization code.
    pub redirect_uri: Url,
    /// Encoded [`AuthorizationState`].
    pub state: String,
}

impl AuthorizationRequest {
    /// Create a new authorization request.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: Url, state: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            state: state.into(),
        }
    }

    /// Path and query of the identity provider's authorize endpoint.
    #[must_use]
    pub fn authorize_path(&self, account_root_path: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("state", &self.state)
            .finish();
        format!("{}/authorize?{query}", account_root_path.trim_end_matches('/'))
    }

    /// Login page URL whose `n` parameter carries the authorize request.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the login URL cannot be built.
    pub fn login_url(&self, account_base_url: &Url, account_root_path: &str) -> DomainResult<Url> {
        let root = account_root_path.trim_end_matches('/');
        let mut url = account_base_url
            .join(&format!("{root}/login"))
            .map_err(|e| DomainError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .clear()
            .append_pair(LOGIN_NEXT_PARAM, &self.authorize_path(root));
        Ok(url)
    }
}
