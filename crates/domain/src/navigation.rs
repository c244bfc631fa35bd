//! Page-load navigation outcomes.

use url::Url;

use crate::TokenRecord;

/// What the browser does after the session guard ran for a page load.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLoadOutcome {
    /// A stored, unexpired token was used; nothing was written.
    Proceed {
        /// Path the browser stays on.
        path: String,
        /// The stored token.
        token: TokenRecord,
    },
    /// A new token was obtained silently and stored.
    Reauthorized {
        /// Path the browser lands on.
        path: String,
        /// The newly stored token.
        token: TokenRecord,
    },
    /// No usable session is left; the browser goes to the login page.
    RedirectToLogin {
        /// Login URL carrying the authorization request.
        location: Url,
    },
}

impl PageLoadOutcome {
    /// Token usable for API calls, if the page loaded.
    #[must_use]
    pub const fn token(&self) -> Option<&TokenRecord> {
        match self {
            Self::Proceed { token, .. } | Self::Reauthorized { token, .. } => Some(token),
            Self::RedirectToLogin { .. } => None,
        }
    }

    /// Path the browser ends up on inside the console, if it stays there.
    #[must_use]
    pub fn landing_path(&self) -> Option<&str> {
        match self {
            Self::Proceed { path, .. } | Self::Reauthorized { path, .. } => Some(path),
            Self::RedirectToLogin { .. } => None,
        }
    }

    /// Returns true if the browser leaves the console.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::RedirectToLogin { .. })
    }
}

/// Keeps `requested` if it lies under `root`, otherwise falls back to `root`.
///
/// The query string is kept. Protocol-relative paths (`//host/...`) never
/// count as being under the root.
#[must_use]
pub fn normalize_requested_path(root: &str, requested: &str) -> String {
    let root = match root.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let path_part = requested
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let under_root = !path_part.starts_with("//")
        && (path_part == root
            || (root == "/" && path_part.starts_with('/'))
            || path_part
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('/')));

    if under_root {
        requested.split('#').next().unwrap_or(root).to_string()
    } else {
        root.to_string()
    }
}
