use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    Json,
};
use serde_json::Value as JsonValue;

use yamaro_core::{RatingEntry, RatingValue, UserId};
use yamaro_infra::Row;

use crate::app::{dto, errors::ApiError, services::AppServices};
use crate::authz;
use crate::context::AuthContext;

/// List a user's ratings as `{movie_id, rating}` pairs.
///
/// Any authenticated caller may read any user's ratings; the path user is not
/// compared with the caller.
pub async fn list_ratings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RatingEntry>>, ApiError> {
    let user_id = UserId::new(user_id);
    tracing::debug!(%user_id, caller = %caller.user_id(), "listing ratings");

    let ratings = services.ratings_for(&user_id).await.inspect_err(|e| {
        tracing::error!(%user_id, error = %e, "listing ratings failed");
    })?;

    tracing::debug!(%user_id, count = ratings.len(), "ratings listed");
    Ok(Json(ratings))
}

/// Fetch one rating. A missing (user, movie) pair is reported like any other
/// store failure.
pub async fn get_rating(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, movie_id)): Path<(String, String)>,
) -> Result<Json<RatingValue>, ApiError> {
    let user_id = UserId::new(user_id);
    tracing::debug!(%user_id, %movie_id, "fetching rating");

    let rating = services.rating_for(&user_id, &movie_id).await.inspect_err(|e| {
        tracing::error!(%user_id, %movie_id, error = %e, "fetching rating failed");
    })?;

    Ok(Json(rating))
}

/// Create or overwrite the caller's rating of a movie.
///
/// Ownership is checked before anything else; only then are `movie_id` and
/// `rating` required to be present.
pub async fn save_rating(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<AuthContext>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<Row>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::data(e.body_text()))?;
    let body = dto::RatingRequest::from_json(body);
    tracing::debug!(caller = %caller.user_id(), user_id = ?body.user_id, "saving rating");

    authz::authorize_write(&caller, body.claimed_owner())?;
    let rating = body.into_rating(caller.user_id()).map_err(ApiError::data)?;

    let row = services.save_rating(&rating).await.inspect_err(|e| {
        tracing::error!(
            user_id = %rating.user_id,
            movie_id = %rating.movie_id,
            error = %e,
            "saving rating failed"
        );
    })?;

    Ok(Json(row))
}
