//! Session cookie types.
//!
//! The console session lives in the `_console_auth` cookie, the account app
//! session in `_session` on the account origin. Only their presence and
//! expiry matter here; the values are opaque.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the console session cookie.
pub const CONSOLE_AUTH_COOKIE: &str = "_console_auth";

/// Name of the account app (identity provider) session cookie.
pub const ACCOUNT_SESSION_COOKIE: &str = "_session";

/// A single HTTP cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie belongs to.
    pub domain: String,
    /// Path the cookie applies to.
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiration time (None for session cookies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    /// HttpOnly flag.
    #[serde(default)]
    pub http_only: bool,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// SameSite attribute.
    #[serde(default)]
    pub same_site: SameSite,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Create a new cookie.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into().trim_start_matches('.').to_lowercase(),
            path: default_path(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::default(),
        }
    }

    /// Set the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the expiration.
    #[must_use]
    pub const fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set HttpOnly flag.
    #[must_use]
    pub const fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set Secure flag.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Check if the cookie is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp <= now)
    }

    /// Check if this is a session cookie (no expiration).
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// Check if the cookie is sent to `host`.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        domain_matches(&self.domain, host)
    }

    /// Format for Cookie header.
    #[must_use]
    pub fn to_cookie_header(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Parse from a `Set-Cookie` header received from `request_domain`.
    ///
    /// `Max-Age` is resolved against `now`; `Max-Age=0` yields an already
    /// expired cookie, which is how servers delete a session.
    #[must_use]
    pub fn from_set_cookie(header: &str, request_domain: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Self::new(name, value.trim(), request_domain);

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_lowercase().as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_lowercase(),
                    "path" => cookie.path = val.to_string(),
                    "expires" => {
                        if let Ok(exp) = DateTime::parse_from_rfc2822(val) {
                            cookie.expires = Some(exp.with_timezone(&Utc));
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = max_age_expiry(now, secs);
                        }
                    }
                    "samesite" => cookie.same_site = SameSite::parse(val),
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "httponly" => cookie.http_only = true,
                    "secure" => cookie.secure = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }
}

/// Expiry for a `Max-Age` of `secs` seconds.
///
/// Zero or negative ages expire immediately; ages past the representable
/// range never expire.
fn max_age_expiry(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return Some(now);
    }
    chrono::Duration::try_seconds(secs).and_then(|age| now.checked_add_signed(age))
}

/// SameSite attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Cookies are sent with all requests.
    None,
    /// Cookies are sent with top-level navigations and GET from third-party sites.
    #[default]
    Lax,
    /// Cookies are only sent in first-party context.
    Strict,
}

impl SameSite {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "strict" => Self::Strict,
            "none" => Self::None,
            _ => Self::Lax,
        }
    }
}

/// Cookie jar of one browser profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CookieJar {
    /// Stored cookies by domain.
    #[serde(default)]
    cookies: BTreeMap<String, Vec<Cookie>>,
}

impl CookieJar {
    /// Create a new empty cookie jar.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cookies: BTreeMap::new(),
        }
    }

    /// Add a cookie, replacing one with the same name and path.
    ///
    /// A cookie that is already expired at `now` deletes its namesake instead.
    pub fn add(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        let cookies = self.cookies.entry(cookie.domain.clone()).or_default();
        cookies.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired_at(now) {
            cookies.push(cookie);
        }
        self.cookies.retain(|_, cookies| !cookies.is_empty());
    }

    /// Remove a cookie by name and domain.
    pub fn remove(&mut self, name: &str, domain: &str) {
        if let Some(cookies) = self.cookies.get_mut(domain) {
            cookies.retain(|c| c.name != name);
        }
        self.cookies.retain(|_, cookies| !cookies.is_empty());
    }

    /// Remove every cookie called `name`, whatever its domain.
    pub fn remove_named(&mut self, name: &str) {
        for cookies in self.cookies.values_mut() {
            cookies.retain(|c| c.name != name);
        }
        self.cookies.retain(|_, cookies| !cookies.is_empty());
    }

    /// Find an unexpired cookie called `name` that is sent to `host`.
    #[must_use]
    pub fn find_valid(&self, name: &str, host: &str, now: DateTime<Utc>) -> Option<&Cookie> {
        self.cookies
            .values()
            .flatten()
            .find(|c| c.name == name && c.matches_host(host) && !c.is_expired_at(now))
    }

    /// Get all cookies.
    #[must_use]
    pub fn all(&self) -> Vec<&Cookie> {
        self.cookies.values().flatten().collect()
    }

    /// Clear all cookies.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Remove expired cookies.
    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) {
        for cookies in self.cookies.values_mut() {
            cookies.retain(|c| !c.is_expired_at(now));
        }
        self.cookies.retain(|_, cookies| !cookies.is_empty());
    }

    /// Get the total number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.values().map(Vec::len).sum()
    }

    /// Check if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Process Set-Cookie headers from a response.
    pub fn process_set_cookies(
        &mut self,
        headers: &[(String, String)],
        request_domain: &str,
        now: DateTime<Utc>,
    ) {
        for (name, value) in headers {
            if name.eq_ignore_ascii_case("set-cookie")
                && let Some(cookie) = Cookie::from_set_cookie(value, request_domain, now)
            {
                self.add(cookie, now);
            }
        }
    }
}

/// Check if a cookie domain matches a request host.
fn domain_matches(cookie_domain: &str, request_host: &str) -> bool {
    let cookie_domain = cookie_domain.to_lowercase();
    let request_host = request_host.to_lowercase();

    cookie_domain == request_host || request_host.ends_with(&format!(".{cookie_domain}"))
}
