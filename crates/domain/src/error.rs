//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A root or requested path is not an absolute path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A token record violates the token contract.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An authorization `state` parameter could not be encoded or decoded.
    #[error("invalid authorization state: {0}")]
    InvalidState(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
