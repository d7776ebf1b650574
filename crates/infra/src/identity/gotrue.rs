//! Identity provider backed by the hosted auth REST interface (`/auth/v1`).

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::instrument;

use yamaro_auth::{AuthResponse, AuthUser, Credentials, IdentityError, IdentityProvider, Session};

use crate::config::BackendConfig;
use crate::http;

const ERROR_FIELDS: &[&str] = &["msg", "error_description", "message", "error"];

/// REST-backed identity provider.
///
/// Like the hosted backend's own client libraries, it remembers the session
/// opened by its last sign-up/sign-in; `sign_out` terminates that session.
#[derive(Debug)]
pub struct GoTrueIdentity {
    client: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
}

impl GoTrueIdentity {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            session: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn remember(&self, session: Option<&Session>) {
        if let Ok(mut current) = self.session.write() {
            *current = session.cloned();
        }
    }

    fn current_token(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
    }

    async fn parse<T: DeserializeOwned>(
        resp: Result<Response, reqwest::Error>,
    ) -> Result<T, IdentityError> {
        let resp = resp.map_err(|e| IdentityError::transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(IdentityError::rejected(http::error_message(resp, ERROR_FIELDS).await));
        }
        resp.json::<T>()
            .await
            .map_err(|e| IdentityError::transport(format!("unreadable response: {e}")))
    }

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<JsonValue, IdentityError> {
        let resp = self
            .client
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(credentials)
            .send()
            .await;
        Self::parse(resp).await
    }
}

/// Normalize a sign-up/sign-in body into `{user, session}`.
///
/// The auth endpoint answers with a session when the account is logged in
/// immediately, and with the bare user when confirmation is still pending.
pub(crate) fn auth_response(body: JsonValue) -> Result<AuthResponse, IdentityError> {
    let unreadable =
        |e: serde_json::Error| IdentityError::transport(format!("unreadable response: {e}"));

    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body).map_err(unreadable)?;
        return Ok(AuthResponse::from_session(session));
    }

    let user: AuthUser = serde_json::from_value(body).map_err(unreadable)?;
    Ok(AuthResponse {
        user: Some(user),
        session: None,
    })
}

#[async_trait]
impl IdentityProvider for GoTrueIdentity {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, IdentityError> {
        let body = self.post_credentials("signup", credentials).await?;
        let resp = auth_response(body)?;
        if resp.session.is_some() {
            self.remember(resp.session.as_ref());
        }
        Ok(resp)
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, IdentityError> {
        let body = self.post_credentials("token?grant_type=password", credentials).await?;
        let resp = auth_response(body)?;
        self.remember(resp.session.as_ref());
        Ok(resp)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(token) = self.current_token() else {
            return Ok(());
        };

        let resp = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| IdentityError::transport(e.to_string()))?;

        // The session is gone once the server no longer knows it. Any other
        // failure keeps it, so the caller can retry.
        let status = resp.status();
        if status.is_success()
            || matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            )
        {
            self.remember(None);
            return Ok(());
        }
        Err(IdentityError::rejected(http::error_message(resp, ERROR_FIELDS).await))
    }

    #[instrument(skip_all)]
    async fn get_user(&self, token: &str) -> Result<AuthUser, IdentityError> {
        let resp = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await;
        Self::parse(resp).await
    }
}
