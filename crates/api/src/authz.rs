//! API-side ownership guard for user-scoped writes.
//!
//! Enforced at the handler boundary, before anything reaches the store.

use yamaro_auth::authorize_owner;
use crate::app::errors::ApiError;
use crate::context::AuthContext;

/// Check that the authenticated caller owns the record the payload targets.
///
/// `owner` is the payload's claim; callers pass `None` when it is absent or
/// not a string.
pub fn authorize_write(caller: &AuthContext, owner: Option<&str>) -> Result<(), ApiError> {
    authorize_owner(caller.user_id(), owner).map_err(|e| {
        tracing::warn!(error = %e, "write rejected");
        ApiError::NotOwner
    })
}
