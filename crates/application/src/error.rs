//! Application error types

use thiserror::Error;
use sessiongate_domain::DomainError;

use crate::ports::{CookieStoreError, IssuerError, StorageError};

/// Application-level errors.
///
/// A redirect to the login page is not an error; everything here is an
/// unexpected failure that should end in the full error view.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Local storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cookie jar could not be read or written.
    #[error("cookie jar error: {0}")]
    Cookies(#[from] CookieStoreError),

    /// Silent reauthorization failed for a reason other than an invalid session.
    #[error("reauthorization failed: {0}")]
    Reauthorization(#[source] IssuerError),

    /// The identity provider failed for a reason other than an expired
    /// account session.
    #[error("silent authorization failed: {0}")]
    Authorization(#[source] IssuerError),

    /// The authorization code could not be exchanged for a session.
    #[error("code exchange failed: {0}")]
    CodeExchange(#[source] IssuerError),

    /// A callback arrived without a login having been started here.
    #[error("no pending authorization for this console")]
    NoPendingAuthorization,

    /// The callback `state` does not match the pending authorization.
    #[error("authorization state mismatch")]
    StateMismatch,
}

/// Result type alias for application operations.
pub type SessionResult<T> = Result<T, SessionError>;
