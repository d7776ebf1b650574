use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde_json::Value as JsonValue;

use yamaro_infra::Row;

use crate::app::{dto, errors::ApiError, services::AppServices};

/// Record a watched movie.
///
/// Anonymous, and `user_id` is taken from the payload as-is: any caller can
/// write on behalf of any user. Values are only checked for presence.
pub async fn record_watched(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::data(e.body_text()))?;
    let watched = dto::WatchedMovieRequest::from_json(body)
        .into_record()
        .map_err(ApiError::data)?;

    let rows = services.record_watched(&watched).await.inspect_err(|e| {
        tracing::error!(
            user_id = %watched.user_id,
            movie_id = %watched.movie_id,
            error = %e,
            "recording watched movie failed"
        );
    })?;

    Ok(Json(rows))
}
