use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use yamaro_auth::{AuthResponse, AuthUser};

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::context::AuthContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::auth(e.body_text()))?;
    let credentials = body.into_credentials().map_err(ApiError::auth)?;

    let resp = services.register(&credentials).await.inspect_err(|e| {
        tracing::info!(email = %credentials.email, error = %e, "registration refused");
    })?;

    Ok(Json(resp))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::auth(e.body_text()))?;
    let credentials = body.into_credentials().map_err(ApiError::auth)?;

    let resp = services.login(&credentials).await.inspect_err(|e| {
        tracing::info!(email = %credentials.email, error = %e, "login refused");
    })?;

    Ok(Json(resp))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<dto::MessageResponse>, ApiError> {
    services.logout().await?;
    tracing::debug!(user_id = %caller.user_id(), "signed out");

    Ok(Json(dto::MessageResponse {
        message: "Déconnexion réussie",
    }))
}

pub async fn me(Extension(caller): Extension<AuthContext>) -> Json<AuthUser> {
    Json(caller.into_user())
}
