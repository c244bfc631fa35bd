//! File-backed browser profile state.
//!
//! A profile directory holds:
//! - `local_storage.json`: the local storage of the console origin
//! - `cookies.json`: the cookie jar

mod cookie_jar;
mod file_system;
mod local_storage;

pub use cookie_jar::FileCookieStore;
pub use file_system::TokioFileSystem;
pub use local_storage::FileStorage;
