use yamaro_auth::AuthUser;
use yamaro_core::UserId;

/// Authenticated caller of a protected request.
///
/// Built by the authentication middleware and handed to handlers as an
/// extractor; handlers never look the caller up themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    user: AuthUser,
}

impl AuthContext {
    pub fn new(user: AuthUser) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn into_user(self) -> AuthUser {
        self.user
    }
}
