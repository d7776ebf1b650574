//! Capability interface of the identity provider.

use async_trait::async_trait;
use thiserror::Error;

use crate::{AuthResponse, AuthUser, Credentials};

/// Failure reported by the identity provider.
///
/// The message is surfaced to HTTP callers as-is; the gateway does not
/// classify provider failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider rejected the request.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered with garbage.
    #[error("{0}")]
    Transport(String),
}

impl IdentityError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn message(&self) -> &str {
        match self {
            IdentityError::Rejected(msg) | IdentityError::Transport(msg) => msg,
        }
    }
}

/// Account registration, credential verification, session termination and
/// token resolution.
///
/// Implementations hold their own connection state; the gateway builds one at
/// startup and shares it behind an `Arc<dyn IdentityProvider>`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account.
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, IdentityError>;

    /// Verify an e-mail/password pair and open a session.
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, IdentityError>;

    /// Terminate the client's current session.
    ///
    /// This acts on the provider client's own session, not on any caller's token.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Resolve a bearer token to the user it was issued to.
    async fn get_user(&self, token: &str) -> Result<AuthUser, IdentityError>;
}

#[async_trait]
impl<P> IdentityProvider for std::sync::Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, IdentityError> {
        (**self).sign_up(credentials).await
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, IdentityError> {
        (**self).sign_in_with_password(credentials).await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        (**self).sign_out().await
    }

    async fn get_user(&self, token: &str) -> Result<AuthUser, IdentityError> {
        (**self).get_user(token).await
    }
}
