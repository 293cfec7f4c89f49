//! API-side authorization guards.
//!
//! Authentication happens in the auth middleware; these checks run at the
//! start of handlers that need more than a valid token.

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Admin-only routes: deletes and user administration.
pub fn require_admin(principal: &PrincipalContext) -> Result<(), ApiError> {
    if principal.is_admin() {
        return Ok(());
    }
    tracing::info!(user = principal.sub(), "admin route refused");
    Err(ApiError::forbidden())
}
