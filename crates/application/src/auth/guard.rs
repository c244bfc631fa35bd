//! Session guard run on every console page load.
//!
//! Decision per load:
//! 1. an unexpired stored token is used as-is, without touching the backend;
//! 2. otherwise a valid console session cookie is traded for a new token,
//!    which is written exactly once;
//! 3. otherwise a valid account app session is used to authorize the console
//!    silently, establishing a new console session and then a token;
//! 4. otherwise the browser is sent to the identity provider's login page
//!    with an authorization request remembering the requested path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use sessiongate_domain::{
    AuthorizationRequest, AuthorizationState, Cookie, PageLoadOutcome, SessionConfig, StorageKey,
    TokenRecord, normalize_requested_path,
};
use tracing::{debug, info, warn};

use crate::auth::{TokenStatus, TokenStore};
use crate::ports::{Authorizer, Clock, CookieStore, KeyValueStorage, StorageError, TokenIssuer};
use crate::{SessionError, SessionResult};

const NONCE_LEN: usize = 32;

/// Client-side session guard of one console root path.
pub struct SessionGuard {
    config: SessionConfig,
    storage: Arc<dyn KeyValueStorage>,
    tokens: TokenStore,
    cookies: Arc<dyn CookieStore>,
    issuer: Arc<dyn TokenIssuer>,
    authorizer: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
}

impl SessionGuard {
    /// Creates a guard over the injected ports.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Domain`] if the configuration is invalid.
    pub fn new(
        config: SessionConfig,
        storage: Arc<dyn KeyValueStorage>,
        cookies: Arc<dyn CookieStore>,
        issuer: Arc<dyn TokenIssuer>,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
    ) -> SessionResult<Self> {
        config.validate()?;
        let tokens = TokenStore::new(storage.clone(), config.normalized_root())
            .with_refresh_buffer(config.refresh_buffer_seconds);
        Ok(Self {
            config,
            storage,
            tokens,
            cookies,
            issuer,
            authorizer,
            clock,
        })
    }

    /// The guard's configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The typed access token record.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Storage key of the access token record.
    #[must_use]
    pub const fn storage_key(&self) -> &StorageKey {
        self.tokens.key()
    }

    fn auth_state_key(&self) -> StorageKey {
        StorageKey::auth_state(self.config.normalized_root())
    }

    /// Runs the guard for a page load of `requested_path`.
    ///
    /// # Errors
    ///
    /// Returns an error for unexpected failures only: storage or cookie jar
    /// failures, issuer or identity provider failures other than a rejected
    /// session, and issued tokens that are empty or already expired. An
    /// invalid session is not an error; once no session is left it yields
    /// [`PageLoadOutcome::RedirectToLogin`].
    pub async fn on_page_load(&self, requested_path: &str) -> SessionResult<PageLoadOutcome> {
        let now = self.clock.now();
        let path = normalize_requested_path(self.config.normalized_root(), requested_path);

        if let Some(token) = self.tokens.get_valid(now).await? {
            debug!(path = %path, token = %token.preview(), "using stored access token");
            return Ok(PageLoadOutcome::Proceed { path, token });
        }

        match self.console_session(now).await? {
            Some(session) => {
                if let Some(token) = self.issue_token(&session, now).await? {
                    info!(path = %path, "obtained new access token");
                    return Ok(PageLoadOutcome::Reauthorized { path, token });
                }
                debug!(path = %path, "console session rejected");
            }
            None => debug!(path = %path, "no console session cookie"),
        }

        if let Some(session) = self.renew_console_session(&path).await? {
            let now = self.clock.now();
            if let Some(token) = self.issue_token(&session, now).await? {
                info!(path = %path, "obtained new access token for a new console session");
                return Ok(PageLoadOutcome::Reauthorized { path, token });
            }
            debug!(path = %path, "new console session rejected");
        }

        self.redirect_to_login(&path).await
    }

    async fn console_session(&self, now: DateTime<Utc>) -> SessionResult<Option<Cookie>> {
        Ok(self
            .cookies
            .find_valid(&self.config.cookie_name, self.config.console_host(), now)
            .await?)
    }

    /// Trades `session` for a new stored token; `None` if the session is rejected.
    async fn issue_token(
        &self,
        session: &Cookie,
        now: DateTime<Utc>,
    ) -> SessionResult<Option<TokenRecord>> {
        match self.issuer.issue_token(session).await {
            Ok(token) => {
                token.validate_issued(now)?;
                self.tokens.store(&token).await?;
                debug!(
                    token = %token.preview(),
                    expiry = %token.expiry.to_rfc3339(),
                    "stored issued access token"
                );
                Ok(Some(token))
            }
            Err(e) if e.requires_login() => {
                debug!(error = %e, "token request rejected");
                Ok(None)
            }
            Err(e) => Err(SessionError::Reauthorization(e)),
        }
    }

    /// Establishes a new console session through the account app session.
    ///
    /// Returns `None` when there is no usable account session, in which case
    /// the user has to log in.
    async fn renew_console_session(&self, path: &str) -> SessionResult<Option<Cookie>> {
        let account = self
            .cookies
            .find_valid(
                &self.config.account_cookie_name,
                self.config.account_host(),
                self.clock.now(),
            )
            .await?;
        let Some(account) = account else {
            debug!("no account session cookie");
            return Ok(None);
        };

        let request = self.begin_authorization(path).await?;
        match self.authorizer.authorize(&account, &request).await {
            Ok(code) => {
                self.complete_authorization(&code, &request.state).await?;
                self.console_session(self.clock.now()).await
            }
            Err(e) if e.requires_login() => {
                debug!(error = %e, "account session rejected");
                Ok(None)
            }
            Err(e) => Err(SessionError::Authorization(e)),
        }
    }

    /// Creates an authorization request for `path` and remembers its state.
    async fn begin_authorization(&self, path: &str) -> SessionResult<AuthorizationRequest> {
        let nonce = Alphanumeric.sample_string(&mut rand::rng(), NONCE_LEN);
        let state = AuthorizationState::new(nonce, path);
        let pending =
            serde_json::to_string(&state).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage
            .set_item(self.auth_state_key().as_str(), &pending)
            .await?;

        Ok(AuthorizationRequest::new(
            self.config.client_id.clone(),
            self.config.callback_url()?,
            state.encode()?,
        ))
    }

    async fn redirect_to_login(&self, path: &str) -> SessionResult<PageLoadOutcome> {
        let request = self.begin_authorization(path).await?;
        let location =
            request.login_url(&self.config.account_base_url, &self.config.account_root_path)?;
        info!(path = %path, location = %location.path(), "redirecting to login");
        Ok(PageLoadOutcome::RedirectToLogin { location })
    }

    /// Handles the callback leg of the login flow.
    ///
    /// Verifies `state` against the pending authorization, exchanges `code`
    /// for a new console session cookie and returns the path the browser
    /// originally asked for.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPendingAuthorization`] or
    /// [`SessionError::StateMismatch`] when the callback does not belong to a
    /// login started here, and [`SessionError::CodeExchange`] when the backend
    /// refuses the code.
    pub async fn complete_authorization(&self, code: &str, state: &str) -> SessionResult<String> {
        let key = self.auth_state_key();
        let Some(raw) = self.storage.get_item(key.as_str()).await? else {
            return Err(SessionError::NoPendingAuthorization);
        };
        let pending: AuthorizationState = serde_json::from_str(&raw).map_err(|e| {
            warn!(key = %key, error = %e, "undecodable pending authorization");
            SessionError::NoPendingAuthorization
        })?;

        let returned = AuthorizationState::decode(state)?;
        if returned != pending {
            return Err(SessionError::StateMismatch);
        }
        self.storage.remove_item(key.as_str()).await?;

        let session = self
            .issuer
            .exchange_code(code, state)
            .await
            .map_err(SessionError::CodeExchange)?;
        self.cookies.set_cookie(session, self.clock.now()).await?;

        let next = normalize_requested_path(self.config.normalized_root(), &returned.next);
        info!(next = %next, "console session established");
        Ok(next)
    }

    /// Status of the stored access token.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be read.
    pub async fn status(&self) -> SessionResult<TokenStatus> {
        self.tokens.get_status(self.clock.now()).await
    }

    /// Removes the stored access token, keeping the session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be written.
    pub async fn clear_token(&self) -> SessionResult<()> {
        self.tokens.remove().await?;
        debug!(key = %self.storage_key(), "cleared access token");
        Ok(())
    }

    /// Forgets the token, the pending authorization and both session cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage or the cookie jar cannot be written.
    pub async fn logout(&self) -> SessionResult<()> {
        self.tokens.remove().await?;
        self.storage
            .remove_item(self.auth_state_key().as_str())
            .await?;
        self.cookies.remove_named(&self.config.cookie_name).await?;
        self.cookies
            .remove_named(&self.config.account_cookie_name)
            .await?;
        info!("logged out of console and account sessions");
        Ok(())
    }
}
