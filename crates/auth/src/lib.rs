//! `yamaro-auth` — identity boundary of the gateway.
//!
//! This crate is intentionally decoupled from HTTP and storage: it names the
//! capabilities the gateway needs from an identity provider and the pure
//! ownership policy applied to writes.

pub mod identity;
pub mod ownership;
pub mod user;

pub use identity::{IdentityError, IdentityProvider};
pub use ownership::{authorize_owner, OwnershipError};
pub use user::{AuthResponse, AuthUser, Credentials, Session};
