//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session guard and the browser or
//! backend it runs against. Each port is a trait implemented by adapters in
//! the infrastructure layer (or by the in-memory adapters in [`crate::auth`]).

mod authorizer;
mod clock;
mod cookie_store;
mod file_system;
mod storage;
mod token_issuer;

pub use authorizer::Authorizer;
pub use clock::Clock;
pub use cookie_store::{CookieStore, CookieStoreError};
pub use file_system::{FileSystem, FileSystemError};
pub use storage::{KeyValueStorage, StorageError};
pub use token_issuer::{IssuerError, TokenIssuer};
