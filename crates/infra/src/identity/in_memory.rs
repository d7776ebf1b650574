use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

use yamaro_auth::{AuthResponse, AuthUser, Credentials, IdentityError, IdentityProvider, Session};
use yamaro_core::{Collection, UserId};

use crate::record_store::{RecordStore, Row};

const SESSION_TTL_SECS: i64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, UserId>,
    current_session: Option<String>,
}

/// In-memory identity provider.
///
/// Intended for tests/dev: passwords are kept as given and tokens are random
/// opaque strings that never expire.
pub struct InMemoryIdentity {
    state: RwLock<State>,
    users: Option<Arc<dyn RecordStore>>,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            users: None,
        }
    }

    /// Also write every registered user into the `users` collection of `store`.
    pub fn with_user_directory(store: Arc<dyn RecordStore>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            users: Some(store),
        }
    }

    /// Register an account under a caller-chosen id (fixtures).
    pub async fn seed_account(
        &self,
        id: UserId,
        credentials: &Credentials,
    ) -> Result<AuthUser, IdentityError> {
        self.register(id, credentials).await
    }

    /// Token of the client's current session, if signed in.
    pub fn current_session(&self) -> Option<String> {
        self.state.read().ok().and_then(|s| s.current_session.clone())
    }

    fn poisoned() -> IdentityError {
        IdentityError::transport("lock poisoned")
    }

    async fn register(
        &self,
        id: UserId,
        credentials: &Credentials,
    ) -> Result<AuthUser, IdentityError> {
        let email = credentials.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(IdentityError::rejected("Anonymous sign-ins are disabled"));
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::rejected("Password should be at least 6 characters."));
        }

        let mut extra = Map::new();
        extra.insert("aud".to_string(), json!("authenticated"));
        extra.insert("role".to_string(), json!("authenticated"));
        extra.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        let user = AuthUser {
            id,
            email: Some(email.clone()),
            extra,
        };

        {
            let mut state = self.state.write().map_err(|_| Self::poisoned())?;
            if state.accounts.contains_key(&email) {
                return Err(IdentityError::rejected("User already registered"));
            }
            state.accounts.insert(
                email.clone(),
                Account {
                    user: user.clone(),
                    password: credentials.password.clone(),
                },
            );
        }

        if let Some(store) = &self.users {
            let mut row = Row::new();
            row.insert("id".to_string(), json!(user.id));
            row.insert("email".to_string(), json!(email));
            if let Err(e) = store.insert(Collection::Users, vec![row]).await {
                tracing::error!(error = %e, "failed to mirror new user into directory");
                if let Ok(mut state) = self.state.write() {
                    state.accounts.remove(&email);
                }
                return Err(IdentityError::rejected("Database error saving new user"));
            }
        }

        Ok(user)
    }

    fn open_session(&self, user: AuthUser) -> Result<Session, IdentityError> {
        let token = Uuid::now_v7().simple().to_string();
        let expires_at = Utc::now() + ChronoDuration::seconds(SESSION_TTL_SECS);

        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.tokens.insert(token.clone(), user.id.clone());
        state.current_session = Some(token.clone());

        let mut extra = Map::new();
        extra.insert("token_type".to_string(), json!("bearer"));
        extra.insert("expires_in".to_string(), json!(SESSION_TTL_SECS));
        extra.insert("expires_at".to_string(), json!(expires_at.timestamp()));
        extra.insert(
            "refresh_token".to_string(),
            JsonValue::String(Uuid::now_v7().simple().to_string()),
        );

        Ok(Session {
            access_token: token,
            user: Some(user),
            extra,
        })
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, IdentityError> {
        let user = self.register(UserId::new(Uuid::now_v7().to_string()), credentials).await?;
        let session = self.open_session(user)?;
        Ok(AuthResponse::from_session(session))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, IdentityError> {
        let email = credentials.email.trim().to_lowercase();
        let account = {
            let state = self.state.read().map_err(|_| Self::poisoned())?;
            state.accounts.get(&email).cloned()
        };

        match account {
            Some(account) if account.password == credentials.password => {
                let session = self.open_session(account.user)?;
                Ok(AuthResponse::from_session(session))
            }
            _ => Err(IdentityError::rejected("Invalid login credentials")),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.current_session = None;
        Ok(())
    }

    async fn get_user(&self, token: &str) -> Result<AuthUser, IdentityError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        let user_id = state
            .tokens
            .get(token)
            .ok_or_else(|| {
                IdentityError::rejected("invalid JWT: unable to parse or verify signature")
            })?;

        state
            .accounts
            .values()
            .find(|a| &a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| IdentityError::rejected("User from sub claim in JWT does not exist"))
    }
}
