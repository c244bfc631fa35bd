//! Identity provider authorization port
//!
//! The account app keeps its own session. While that session is valid, an
//! authorization request is granted without showing the login page.

use async_trait::async_trait;
use sessiongate_domain::{AuthorizationRequest, Cookie};

use crate::ports::IssuerError;

/// Port for silently authorizing the console at the identity provider.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Sends `request` with the account app session and returns the
    /// authorization code granted for it.
    ///
    /// # Errors
    /// Returns [`IssuerError::SessionRejected`] when the account session no
    /// longer authorizes anything and the user has to log in, any other
    /// variant for unexpected failures.
    async fn authorize(
        &self,
        account_session: &Cookie,
        request: &AuthorizationRequest,
    ) -> Result<String, IssuerError>;
}
