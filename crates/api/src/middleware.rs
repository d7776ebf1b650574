use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use yamaro_auth::IdentityProvider;

use crate::app::errors::ApiError;
use crate::context::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<dyn IdentityProvider>,
}

/// Resolve the bearer token to a user and attach an [`AuthContext`].
///
/// - no/malformed `Authorization` header: 401 `Token manquant`
/// - token rejected by the identity provider, for any reason: 403 `Token invalide`
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::MissingToken)?;

    let user = state.identity.get_user(token).await.map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        ApiError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthContext::new(user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token)
}
