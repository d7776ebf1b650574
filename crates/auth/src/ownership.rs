//! Ownership policy for user-scoped writes.

use thiserror::Error;

use yamaro_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("caller {caller} may not write records owned by {owner}")]
    NotOwner { caller: UserId, owner: String },
}

/// Allow a write only when the authenticated caller owns the target record.
///
/// `owner` is whatever the payload claimed; an absent owner never matches.
///
/// - No IO
/// - No panics
pub fn authorize_owner(caller: &UserId, owner: Option<&str>) -> Result<(), OwnershipError> {
    match owner {
        Some(owner) if owner == caller.as_str() => Ok(()),
        other => {
            tracing::debug!(%caller, owner = ?other, "ownership check failed");
            Err(OwnershipError::NotOwner {
                caller: caller.clone(),
                owner: other.unwrap_or_default().to_string(),
            })
        }
    }
}
