//! Sessiongate Domain - Core session types
//!
//! This crate defines the domain model for the console session client:
//! token records, storage keys, session cookies and the authorization
//! request sent to the identity provider.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod cookie;
pub mod error;
pub mod navigation;
pub mod settings;
pub mod storage_key;

pub use auth::{AuthorizationRequest, AuthorizationState, TokenRecord, token_preview};
pub use cookie::{Cookie, CookieJar, SameSite};
pub use error::{DomainError, DomainResult};
pub use navigation::{PageLoadOutcome, normalize_requested_path};
pub use settings::SessionConfig;
pub use storage_key::{StorageKey, string_to_hash};
