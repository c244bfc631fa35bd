//! Authentication domain types

mod authorize;
mod types;

pub use authorize::{AuthorizationRequest, AuthorizationState};
pub use types::{TokenRecord, token_preview};
