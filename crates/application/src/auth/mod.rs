//! Authentication module of the session client.
//!
//! This module provides:
//! - The typed access token record with expiry tracking
//! - The session guard deciding between stored token, silent
//!   reauthorization and login redirect
//! - In-memory local storage and cookie jar adapters

mod guard;
mod memory;
mod token_store;

pub use guard::SessionGuard;
pub use memory::{MemoryCookieStore, MemoryStorage};
pub use token_store::{TokenStatus, TokenStore};
