//! Users, sessions and credentials as exchanged with the identity provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use yamaro_core::UserId;

/// E-mail/password pair submitted to register or log in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A user record resolved by the identity provider.
///
/// Only `id` and `email` are interpreted by the gateway; every other field the
/// provider returned is kept in `extra` and serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AuthUser {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
            extra: Map::new(),
        }
    }
}

/// An issued session. `access_token` is the bearer token clients send back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Result of a sign-up or sign-in.
///
/// `session` is `None` when the provider created the account but did not log
/// it in (e.g. e-mail confirmation pending).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

impl AuthResponse {
    /// Build a response from a session, hoisting its user to the top level.
    pub fn from_session(session: Session) -> Self {
        Self {
            user: session.user.clone(),
            session: Some(session),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }
}
