use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use yamaro_auth::IdentityError;
use yamaro_infra::RecordStoreError;

/// Every failure a handler can produce, with its HTTP mapping.
///
/// Collaborator messages are passed through untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401: no usable bearer token.
    #[error("Token manquant")]
    MissingToken,

    /// 403: the identity provider did not accept the token.
    #[error("Token invalide")]
    InvalidToken,

    /// 403: the caller tried to write a record owned by someone else.
    #[error("Non autorisé")]
    NotOwner,

    /// 400: an account operation failed.
    #[error("{0}")]
    Auth(String),

    /// 500: a data operation failed.
    #[error("{0}")]
    Data(String),
}

impl ApiError {
    pub fn auth(err: impl core::fmt::Display) -> Self {
        Self::Auth(err.to_string())
    }

    pub fn data(err: impl core::fmt::Display) -> Self {
        Self::Data(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken | ApiError::NotOwner => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::BAD_REQUEST,
            ApiError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        Self::Auth(err.message().to_string())
    }
}

impl From<RecordStoreError> for ApiError {
    fn from(err: RecordStoreError) -> Self {
        Self::data(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}
