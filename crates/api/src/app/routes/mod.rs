use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod ratings;
pub mod system;
pub mod users;
pub mod watched;

/// Endpoints open to anonymous callers.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::banner))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/users", get(users::list_users))
        .route("/api/watched", post(watched::record_watched))
}

/// Endpoints that require a resolved bearer token (see `middleware::auth_middleware`).
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/api/ratings", post(ratings::save_rating))
        .route("/api/ratings/:user_id", get(ratings::list_ratings))
        .route("/api/ratings/:user_id/:movie_id", get(ratings::get_rating))
}
