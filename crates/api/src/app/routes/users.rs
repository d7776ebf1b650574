use std::sync::Arc;

use axum::{extract::Extension, Json};

use yamaro_infra::Row;

use crate::app::{errors::ApiError, services::AppServices};

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Row>>, ApiError> {
    let users = services.list_users().await.inspect_err(|e| {
        tracing::error!(error = %e, "listing users failed");
    })?;
    Ok(Json(users))
}
