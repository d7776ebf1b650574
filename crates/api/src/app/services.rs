//! Collaborator wiring and the typed operations handlers call.
//!
//! Both collaborators are built once at startup and shared by every request.

use std::sync::Arc;

use yamaro_auth::{AuthResponse, Credentials, IdentityProvider};
use yamaro_core::{Collection, NewRating, NewWatchedMovie, RatingEntry, RatingValue, UserId};
use yamaro_infra::{
    BackendConfig, GoTrueIdentity, InMemoryIdentity, InMemoryRecordStore, PostgrestStore, Query,
    RecordStore, Row,
};

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AppServices {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn RecordStore>,
}

/// Build the collaborators: the hosted backend when configured, memory otherwise.
pub fn build_services(backend: Option<BackendConfig>) -> AppServices {
    match backend {
        Some(config) => {
            tracing::info!(url = %config.url, "using hosted backend");
            AppServices::new(
                Arc::new(GoTrueIdentity::new(&config)),
                Arc::new(PostgrestStore::new(&config)),
            )
        }
        None => {
            tracing::warn!(
                "SUPABASE_URL not set; using in-memory identity and store (data is lost on exit)"
            );
            AppServices::in_memory()
        }
    }
}

impl AppServices {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RecordStore>) -> Self {
        Self { identity, store }
    }

    /// In-memory collaborators; registered users show up in the `users` collection.
    pub fn in_memory() -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
        let identity = Arc::new(InMemoryIdentity::with_user_directory(store.clone()));
        Self::new(identity, store)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        Ok(self.identity.sign_up(credentials).await?)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        Ok(self.identity.sign_in_with_password(credentials).await?)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        Ok(self.identity.sign_out().await?)
    }

    pub async fn list_users(&self) -> Result<Vec<Row>, ApiError> {
        Ok(self.store.select(Collection::Users, &Query::all()).await?)
    }

    pub async fn record_watched(&self, watched: &NewWatchedMovie) -> Result<Vec<Row>, ApiError> {
        let row = watched.to_row().map_err(ApiError::data)?;
        Ok(self.store.insert(Collection::WatchedMovies, vec![row]).await?)
    }

    pub async fn ratings_for(&self, user_id: &UserId) -> Result<Vec<RatingEntry>, ApiError> {
        let query = Query::columns(&["rating", "movie_id"]).where_eq("user_id", user_id.as_str());
        let rows = self.store.select(Collection::Ratings, &query).await?;

        rows.into_iter()
            .map(|row| RatingEntry::from_row(row).map_err(ApiError::data))
            .collect()
    }

    /// `movie_id` is the raw path segment; the store coerces it to the column type.
    pub async fn rating_for(
        &self,
        user_id: &UserId,
        movie_id: &str,
    ) -> Result<RatingValue, ApiError> {
        let query = Query::columns(&["rating"])
            .where_eq("user_id", user_id.as_str())
            .where_eq("movie_id", movie_id);
        let row = self.store.select_single(Collection::Ratings, &query).await?;

        RatingValue::from_row(row).map_err(ApiError::data)
    }

    /// Insert or overwrite the caller's rating; returns the stored row.
    pub async fn save_rating(&self, rating: &NewRating) -> Result<Row, ApiError> {
        let row = rating.to_row().map_err(ApiError::data)?;
        let collection = Collection::Ratings;

        self.store
            .upsert(collection, vec![row], collection.conflict_keys())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::data("upsert returned no rows"))
    }
}
