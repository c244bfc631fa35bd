//! Identity provider authorization over HTTP.
//!
//! With a valid account session the `authorize` endpoint answers with a
//! redirect to the console callback carrying `code`. Without one it
//! redirects to the login page instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, LOCATION};
use sessiongate_application::ports::{Authorizer, IssuerError};
use sessiongate_domain::{AuthorizationRequest, Cookie, SessionConfig};
use tracing::debug;
use url::Url;

use super::http_token_issuer::status_error;
use crate::config::ConfigError;

/// Authorizer talking to the account app.
pub struct HttpAuthorizer {
    client: reqwest::Client,
    account_base_url: Url,
    account_root_path: String,
}

impl HttpAuthorizer {
    /// Creates an authorizer for the account app described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            account_base_url: config.account_base_url.clone(),
            account_root_path: config.account_root_path.clone(),
        })
    }
}

/// Reads the authorization code from the redirect `location`.
fn code_from_redirect(location: &Url, status: u16) -> Result<String, IssuerError> {
    let mut code = None;
    for (key, value) in location.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(IssuerError::InvalidResponse(format!(
                    "authorization denied: {value}"
                )));
            }
            _ => {}
        }
    }
    // Anything but a callback with a code is the login page.
    code.ok_or(IssuerError::SessionRejected { status })
}

#[async_trait]
impl Authorizer for HttpAuthorizer {
    async fn authorize(
        &self,
        account_session: &Cookie,
        request: &AuthorizationRequest,
    ) -> Result<String, IssuerError> {
        let url = self
            .account_base_url
            .join(&request.authorize_path(&self.account_root_path))
            .map_err(|e| IssuerError::InvalidResponse(format!("authorize URL: {e}")))?;

        debug!(endpoint = %url.path(), "authorizing with account session");
        let response = self
            .client
            .get(url.clone())
            .header(COOKIE, account_session.to_cookie_header())
            .send()
            .await
            .map_err(|e| IssuerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_redirection() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| IssuerError::InvalidResponse("redirect without location".to_string()))?;
        let location = url
            .join(location)
            .map_err(|e| IssuerError::InvalidResponse(format!("redirect location: {e}")))?;

        code_from_redirect(&location, status.as_u16())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authorizer_for(server: &MockServer) -> HttpAuthorizer {
        let config = SessionConfig {
            account_base_url: Url::parse(&server.uri()).unwrap(),
            ..SessionConfig::default()
        };
        HttpAuthorizer::new(&config).unwrap()
    }

    fn request() -> AuthorizationRequest {
        AuthorizationRequest::new(
            "console",
            Url::parse("http://localhost:1885/console/oauth/callback").unwrap(),
            "st4te",
        )
    }

    #[tokio::test]
    async fn test_code_is_read_from_callback_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .and(query_param("client_id", "console"))
            .and(query_param("state", "st4te"))
            .and(header("cookie", "_session=idp"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "location",
                "http://localhost:1885/console/oauth/callback?code=granted&state=st4te",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let session = Cookie::new("_session", "idp", "127.0.0.1");
        let code = authorizer_for(&server)
            .authorize(&session, &request())
            .await
            .unwrap();

        assert_eq!(code, "granted");
    }

    #[tokio::test]
    async fn test_redirect_to_login_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/oauth/login?n=%2Foauth"),
            )
            .mount(&server)
            .await;

        let session = Cookie::new("_session", "expired", "127.0.0.1");
        let err = authorizer_for(&server)
            .authorize(&session, &request())
            .await
            .unwrap_err();

        assert!(err.requires_login());
    }

    #[tokio::test]
    async fn test_denied_authorization_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(302).insert_header(
                "location",
                "http://localhost:1885/console/oauth/callback?error=access_denied",
            ))
            .mount(&server)
            .await;

        let session = Cookie::new("_session", "idp", "127.0.0.1");
        let err = authorizer_for(&server)
            .authorize(&session, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, IssuerError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = Cookie::new("_session", "idp", "127.0.0.1");
        let err = authorizer_for(&server)
            .authorize(&session, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, IssuerError::UnexpectedStatus { status: 500, .. }));
    }
}
