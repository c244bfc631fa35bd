//! Local storage key derivation.
//!
//! Keys are `<namespace>-<hash(root_path)>` where the hash is the console web
//! UI's 32-bit string hash: for every UTF-16 code unit `c`,
//! `h = (h << 5) - h + c` with two's-complement wrap-around, starting at 0.
//! The decimal rendering is signed, so keys such as `accessToken--1731942006`
//! are expected. Changing this function orphans every stored token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace tag of the access token record.
pub const ACCESS_TOKEN_NAMESPACE: &str = "accessToken";

/// Namespace tag of the pending authorization record.
pub const AUTH_STATE_NAMESPACE: &str = "authState";

/// Deterministic 32-bit hash of a string over its UTF-16 code units.
#[must_use]
pub fn string_to_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// A local storage key scoped to one application root path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Builds `<namespace>-<hash(root_path)>`.
    #[must_use]
    pub fn namespaced(namespace: &str, root_path: &str) -> Self {
        Self(format!("{namespace}-{}", string_to_hash(root_path)))
    }

    /// Key of the access token record for `root_path`.
    #[must_use]
    pub fn access_token(root_path: &str) -> Self {
        Self::namespaced(ACCESS_TOKEN_NAMESPACE, root_path)
    }

    /// Key of the pending authorization record for `root_path`.
    #[must_use]
    pub fn auth_state(root_path: &str) -> Self {
        Self::namespaced(AUTH_STATE_NAMESPACE, root_path)
    }

    /// The raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
