//! Observable session lifecycle of the console, end to end over in-memory
//! browser state and a scripted console backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use url::Url;

use sessiongate_application::ports::{
    Authorizer, Clock, CookieStore, IssuerError, KeyValueStorage, StorageError, TokenIssuer,
};
use sessiongate_application::{MemoryCookieStore, MemoryStorage, SessionGuard};
use sessiongate_domain::{
    AuthorizationRequest, Cookie, PageLoadOutcome, SessionConfig, StorageKey, TokenRecord,
};
use sessiongate_infrastructure::ManualClock;

const HOST: &str = "localhost";

/// Local storage that counts writes per key.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    writes: std::sync::Mutex<Vec<String>>,
}

impl CountingStorage {
    fn writes_to(&self, key: &str) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }
}

#[async_trait]
impl KeyValueStorage for CountingStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys().await
    }
}

/// Console backend: session `valid` gets `token-<n>` for an hour,
/// code `good-code` yields the `valid` session. The account app grants
/// `good-code` to the account session `signed-in`.
struct ScriptedBackend {
    clock: Arc<ManualClock>,
    issued: AtomicUsize,
    authorized: AtomicUsize,
}

#[async_trait]
impl Authorizer for ScriptedBackend {
    async fn authorize(
        &self,
        account_session: &Cookie,
        _request: &AuthorizationRequest,
    ) -> Result<String, IssuerError> {
        self.authorized.fetch_add(1, Ordering::SeqCst);
        if account_session.value == "signed-in" {
            Ok("good-code".to_string())
        } else {
            Err(IssuerError::SessionRejected { status: 302 })
        }
    }
}

#[async_trait]
impl TokenIssuer for ScriptedBackend {
    async fn issue_token(&self, session: &Cookie) -> Result<TokenRecord, IssuerError> {
        if session.value != "valid" {
            return Err(IssuerError::SessionRejected { status: 401 });
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenRecord::new(
            format!("token-{n}"),
            self.clock.now() + Duration::hours(1),
        ))
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> Result<Cookie, IssuerError> {
        if code == "good-code" {
            Ok(Cookie::new("_console_auth", "valid", HOST))
        } else {
            Err(IssuerError::UnexpectedStatus {
                status: 400,
                body: "invalid_grant".to_string(),
            })
        }
    }
}

struct Browser {
    clock: Arc<ManualClock>,
    storage: Arc<CountingStorage>,
    cookies: Arc<MemoryCookieStore>,
    backend: Arc<ScriptedBackend>,
    guard: SessionGuard,
}

impl Browser {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let storage = Arc::new(CountingStorage::default());
        let cookies = Arc::new(MemoryCookieStore::new());
        let backend = Arc::new(ScriptedBackend {
            clock: clock.clone(),
            issued: AtomicUsize::new(0),
            authorized: AtomicUsize::new(0),
        });
        let guard = SessionGuard::new(
            SessionConfig::default(),
            storage.clone(),
            cookies.clone(),
            backend.clone(),
            backend.clone(),
            clock.clone(),
        )
        .unwrap();
        Self {
            clock,
            storage,
            cookies,
            backend,
            guard,
        }
    }

    async fn log_in(&self) {
        self.cookies
            .set_cookie(
                Cookie::new("_console_auth", "valid", HOST),
                self.clock.now(),
            )
            .await
            .unwrap();
    }

    /// Logs in the way the login page does: both the account app and the
    /// console hold a session afterwards.
    async fn log_in_everywhere(&self) {
        self.log_in().await;
        self.cookies
            .set_cookie(Cookie::new("_session", "signed-in", HOST), self.clock.now())
            .await
            .unwrap();
    }

    fn issuer_calls(&self) -> usize {
        self.backend.issued.load(Ordering::SeqCst)
    }

    fn token_key(&self) -> String {
        StorageKey::access_token("/console").to_string()
    }
}

fn state_from(location: &Url) -> String {
    let (_, next) = location.query_pairs().find(|(k, _)| k == "n").unwrap();
    let authorize = Url::parse("http://idp.invalid").unwrap().join(&next).unwrap();
    authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn test_unexpired_tokens_never_reach_the_backend() {
    let browser = Browser::new();
    browser.log_in().await;

    for lifetime in [Duration::seconds(1), Duration::hours(1), Duration::days(30)] {
        let token = TokenRecord::new("stored", browser.clock.now() + lifetime);
        browser.guard.tokens().store(&token).await.unwrap();
        let writes_before = browser.storage.writes_to(&browser.token_key());

        let outcome = browser.guard.on_page_load("/console").await.unwrap();

        assert!(!outcome.is_redirect());
        assert_eq!(outcome.token(), Some(&token));
        assert_eq!(
            browser.storage.writes_to(&browser.token_key()),
            writes_before
        );
    }
    assert_eq!(browser.issuer_calls(), 0);
}

#[tokio::test]
async fn test_removed_token_is_rewritten_exactly_once() {
    let browser = Browser::new();
    browser.log_in().await;
    browser.guard.clear_token().await.unwrap();

    let outcome = browser.guard.on_page_load("/console").await.unwrap();

    assert!(matches!(outcome, PageLoadOutcome::Reauthorized { .. }));
    assert_eq!(browser.storage.writes_to(&browser.token_key()), 1);
    let stored = browser.guard.tokens().get().await.unwrap().unwrap();
    assert!(!stored.access_token.is_empty());
    assert_eq!(outcome.token(), Some(&stored));
}

#[tokio::test]
async fn test_no_token_and_no_session_redirects_to_login() {
    let browser = Browser::new();

    let outcome = browser.guard.on_page_load("/console").await.unwrap();

    let PageLoadOutcome::RedirectToLogin { location } = outcome else {
        panic!("expected a redirect, got {outcome:?}");
    };
    assert!(location.path().contains("/oauth/login"));
    assert!(location.query().unwrap().contains("authorize"));
    assert_eq!(browser.storage.writes_to(&browser.token_key()), 0);
    assert_eq!(browser.issuer_calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_replaced_by_a_new_one() {
    let browser = Browser::new();
    browser.log_in().await;
    let first = browser.guard.on_page_load("/console").await.unwrap();
    let first_token = first.token().unwrap().access_token.clone();

    browser.clock.advance(Duration::hours(2));
    let second = browser.guard.on_page_load("/console").await.unwrap();

    assert!(matches!(second, PageLoadOutcome::Reauthorized { .. }));
    assert_ne!(second.token().unwrap().access_token, first_token);
    assert_eq!(browser.issuer_calls(), 2);
}

#[tokio::test]
async fn test_nested_path_survives_reauthorization() {
    let browser = Browser::new();
    browser.log_in().await;

    let outcome = browser
        .guard
        .on_page_load("/console/applications")
        .await
        .unwrap();

    assert_eq!(outcome.landing_path(), Some("/console/applications"));
}

#[tokio::test]
async fn test_nested_path_survives_login_round_trip() {
    let browser = Browser::new();

    let outcome = browser
        .guard
        .on_page_load("/console/applications")
        .await
        .unwrap();
    let PageLoadOutcome::RedirectToLogin { location } = outcome else {
        panic!("expected a redirect, got {outcome:?}");
    };

    let next = browser
        .guard
        .complete_authorization("good-code", &state_from(&location))
        .await
        .unwrap();
    assert_eq!(next, "/console/applications");

    let landed = browser.guard.on_page_load(&next).await.unwrap();
    assert!(matches!(landed, PageLoadOutcome::Reauthorized { .. }));
    assert_eq!(landed.landing_path(), Some("/console/applications"));
}

#[tokio::test]
async fn test_logout_sends_the_next_load_to_login() {
    let browser = Browser::new();
    browser.log_in().await;
    browser.guard.on_page_load("/console").await.unwrap();

    browser.guard.logout().await.unwrap();

    assert!(browser.cookies.load().await.unwrap().is_empty());
    assert!(
        browser
            .guard
            .on_page_load("/console")
            .await
            .unwrap()
            .is_redirect()
    );
}

#[tokio::test]
async fn test_new_console_session_is_initiated_from_account_session() {
    let browser = Browser::new();
    browser.log_in_everywhere().await;
    browser.cookies.remove_named("_console_auth").await.unwrap();
    browser.guard.clear_token().await.unwrap();

    let outcome = browser
        .guard
        .on_page_load("/console/applications")
        .await
        .unwrap();

    assert!(!outcome.is_redirect());
    assert_eq!(outcome.landing_path(), Some("/console/applications"));
    let stored = browser.guard.tokens().get().await.unwrap().unwrap();
    assert!(!stored.access_token.is_empty());
    assert_eq!(browser.backend.authorized.load(Ordering::SeqCst), 1);
    assert!(
        browser
            .cookies
            .find_valid("_console_auth", HOST, browser.clock.now())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_all_sessions_expired_redirects_to_login() {
    let browser = Browser::new();
    browser.log_in_everywhere().await;
    browser.cookies.clear().await.unwrap();
    browser.guard.clear_token().await.unwrap();

    let outcome = browser.guard.on_page_load("/console").await.unwrap();

    let PageLoadOutcome::RedirectToLogin { location } = outcome else {
        panic!("expected a redirect, got {outcome:?}");
    };
    assert!(location.path().contains("/oauth/login"));
    assert!(location.query().unwrap().contains("authorize"));
    assert_eq!(browser.backend.authorized.load(Ordering::SeqCst), 0);
}
