//! Sessiongate Application - Session guard and ports
//!
//! This crate defines the application layer with:
//! - Port traits (local storage, cookie jar, token issuer, authorizer, clock)
//! - The typed token store and the session guard run on every page load
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod ports;

pub use auth::{MemoryCookieStore, MemoryStorage, SessionGuard, TokenStatus, TokenStore};
pub use error::{SessionError, SessionResult};
pub use ports::{
    Authorizer, Clock, CookieStore, CookieStoreError, IssuerError, KeyValueStorage, StorageError,
    TokenIssuer,
};
