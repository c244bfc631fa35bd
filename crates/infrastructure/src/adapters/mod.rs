//! Infrastructure adapters

mod http_authorizer;
mod http_token_issuer;
mod system_clock;

pub use http_authorizer::HttpAuthorizer;
pub use http_token_issuer::HttpTokenIssuer;
pub use system_clock::{ManualClock, SystemClock};
