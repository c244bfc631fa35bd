//! Token issuer port
//!
//! The console backend turns a valid session cookie into an access token and
//! an authorization code into a new session cookie. Both are external
//! collaborators; only their observable contract is modelled here.

use async_trait::async_trait;
use sessiongate_domain::{Cookie, TokenRecord};

/// Errors returned by a token issuer.
#[derive(Debug, thiserror::Error)]
pub enum IssuerError {
    /// The session is missing, expired or revoked on the server side.
    #[error("session rejected with status {status}")]
    SessionRejected {
        /// HTTP status returned by the backend.
        status: u16,
    },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a status that is neither success nor rejection.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The backend answered successfully but the payload is unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl IssuerError {
    /// Returns true if the user has to log in again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionRejected { .. })
    }
}

/// Port for obtaining tokens and sessions from the console backend.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Silently obtains a new access token for an authenticated session.
    ///
    /// # Errors
    /// Returns [`IssuerError::SessionRejected`] when the session is no longer
    /// valid, any other variant for unexpected failures.
    async fn issue_token(&self, session: &Cookie) -> Result<TokenRecord, IssuerError>;

    /// Exchanges an authorization code for a new console session cookie.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the code or sets no session.
    async fn exchange_code(&self, code: &str, state: &str) -> Result<Cookie, IssuerError>;
}
