use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};

use yamaro_api::app::{build_app, services::AppServices};
use yamaro_auth::{AuthResponse, AuthUser, Credentials, IdentityError, IdentityProvider};
use yamaro_core::{Collection, UserId};
use yamaro_infra::{
    InMemoryIdentity, InMemoryRecordStore, Query, RecordStore, RecordStoreError, Row,
};

struct TestServer {
    base_url: String,
    identity: Arc<InMemoryIdentity>,
    store: Arc<InMemoryRecordStore>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(|identity, store| AppServices::new(identity, store)).await
    }

    /// Same router as prod on an ephemeral port. `wire` picks the collaborators
    /// the app sees; accounts are always seeded into the in-memory ones.
    async fn spawn_with(
        wire: impl FnOnce(Arc<InMemoryIdentity>, Arc<InMemoryRecordStore>) -> AppServices,
    ) -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let identity = Arc::new(InMemoryIdentity::with_user_directory(store.clone()));
        let app = build_app(wire(identity.clone(), store.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            identity,
            store,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create an account with a fixed id and log it in through the API.
    async fn login_as(&self, id: &str) -> String {
        let email = format!("{id}@example.com");
        self.identity
            .seed_account(UserId::new(id), &Credentials::new(&email, "secret123"))
            .await
            .unwrap();

        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": "secret123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: JsonValue = res.json().await.unwrap();
        body["session"]["access_token"].as_str().unwrap().to_string()
    }

    /// Every protected route, with a body where one is expected.
    fn protected_requests(&self) -> Vec<reqwest::RequestBuilder> {
        vec![
            self.client.post(self.url("/auth/logout")),
            self.client.get(self.url("/auth/me")),
            self.client.get(self.url("/api/ratings/u1")),
            self.client.get(self.url("/api/ratings/u1/42")),
            self.client
                .post(self.url("/api/ratings"))
                .json(&json!({ "user_id": "u1", "movie_id": 42, "rating": 5 })),
        ]
    }

    async fn post_rating(&self, token: &str, body: JsonValue) -> reqwest::Response {
        self.client
            .post(self.url("/api/ratings"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn post_watched(&self, body: JsonValue) -> reqwest::Response {
        self.client
            .post(self.url("/api/watched"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str, token: &str) -> (StatusCode, JsonValue) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn banner_is_served_at_root() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "✅ Backend Yamaro API is running.");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let srv = TestServer::spawn().await;

    let mut requests = srv.protected_requests();
    requests.push(
        srv.client
            .get(srv.url("/auth/me"))
            .header("Authorization", "Basic dXNlcjpwYXNz"),
    );
    requests.push(srv.client.get(srv.url("/auth/me")).header("Authorization", "Bearer "));

    for req in requests {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: JsonValue = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Token manquant" }));
    }
    assert!(srv.store.is_empty(Collection::Ratings));
}

#[tokio::test]
async fn rejected_tokens_are_forbidden_on_every_protected_route() {
    let srv = TestServer::spawn().await;

    for req in srv.protected_requests() {
        let res = req.bearer_auth("not-a-token").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: JsonValue = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Token invalide" }));
    }
    assert!(srv.store.is_empty(Collection::Ratings));
}

#[tokio::test]
async fn unreachable_identity_provider_means_forbidden() {
    let srv = TestServer::spawn_with(|_, store| AppServices::new(Arc::new(Unreachable), store))
        .await;

    let (status, body) = srv.get_json("/auth/me", "any-token").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Token invalide" }));
}

#[tokio::test]
async fn register_login_me_round_trip() {
    let srv = TestServer::spawn().await;
    let creds = json!({ "email": "a@b.com", "password": "secret123" });

    let res = srv.client.post(srv.url("/auth/register")).json(&creds).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let registered: JsonValue = res.json().await.unwrap();
    assert_eq!(registered["user"]["email"], "a@b.com");

    let res = srv.client.post(srv.url("/auth/login")).json(&creds).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let logged_in: JsonValue = res.json().await.unwrap();
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);

    let token = logged_in["session"]["access_token"].as_str().unwrap();
    let (status, me) = srv.get_json("/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "a@b.com");
    assert_eq!(me["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn account_failures_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let creds = json!({ "email": "a@b.com", "password": "secret123" });

    srv.client.post(srv.url("/auth/register")).json(&creds).send().await.unwrap();
    let res = srv.client.post(srv.url("/auth/register")).json(&creds).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "User already registered" }));

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "a@b.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid login credentials" }));

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({ "email": "c@d.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "missing field: password" }));
}

#[tokio::test]
async fn logout_ends_client_session_but_not_caller_token() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let res = srv
        .client
        .post(srv.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Déconnexion réussie" }));
    assert_eq!(srv.identity.current_session(), None);

    // Sign-out is service-level: the caller's token still resolves.
    let (status, _) = srv.get_json("/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rating_upsert_is_keyed_by_user_and_movie() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let res = srv
        .post_rating(&token, json!({ "user_id": "u1", "movie_id": 42, "rating": 5 }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let row: JsonValue = res.json().await.unwrap();
    assert_eq!(row, json!({ "user_id": "u1", "movie_id": 42, "rating": 5 }));

    let (status, body) = srv.get_json("/api/ratings/u1/42", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "rating": 5 }));

    let res = srv
        .post_rating(&token, json!({ "user_id": "u1", "movie_id": 42, "rating": 3 }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(srv.store.len(Collection::Ratings), 1);

    let (status, body) = srv.get_json("/api/ratings/u1/42", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "rating": 3 }));
}

#[tokio::test]
async fn rating_for_someone_else_is_refused() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let res = srv
        .post_rating(&token, json!({ "user_id": "u2", "movie_id": 42, "rating": 5 }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Non autorisé" }));

    // Ownership is decided before the payload's other values are looked at.
    let res = srv
        .post_rating(&token, json!({ "user_id": "u2", "movie_id": "tt0111161", "rating": 5 }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Without a string user_id the caller cannot be the owner either.
    for body in [
        json!({ "movie_id": 42, "rating": 5 }),
        json!({ "user_id": null, "movie_id": 42, "rating": 5 }),
        json!({ "user_id": 7, "movie_id": 42, "rating": 5 }),
        json!({ "user_id": ["u1"], "movie_id": 42, "rating": 5 }),
    ] {
        let res = srv.post_rating(&token, body).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: JsonValue = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Non autorisé" }));
    }

    assert!(srv.store.is_empty(Collection::Ratings));
}

#[tokio::test]
async fn rating_values_are_stored_as_sent() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let res = srv
        .post_rating(&token, json!({ "user_id": "u1", "movie_id": "tt0111161", "rating": 4.5 }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let row: JsonValue = res.json().await.unwrap();
    assert_eq!(row, json!({ "user_id": "u1", "movie_id": "tt0111161", "rating": 4.5 }));

    let (status, body) = srv.get_json("/api/ratings/u1/tt0111161", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "rating": 4.5 }));
}

#[tokio::test]
async fn incomplete_rating_is_a_server_error() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let res = srv.post_rating(&token, json!({ "user_id": "u1", "rating": 5 })).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "missing field: movie_id" }));
    assert!(srv.store.is_empty(Collection::Ratings));
}

#[tokio::test]
async fn missing_single_rating_is_a_server_error() {
    let srv = TestServer::spawn().await;
    let token = srv.login_as("u1").await;

    let (status, body) = srv.get_json("/api/ratings/u1/42", &token).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "JSON object requested, multiple (or no) rows returned" }));

    srv.post_rating(&token, json!({ "user_id": "u1", "movie_id": 42, "rating": 5 })).await;
    let (status, body) = srv.get_json("/api/ratings/u1/not-a-number", &token).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "JSON object requested, multiple (or no) rows returned" }));
}

#[tokio::test]
async fn ratings_list_projects_and_is_readable_by_any_caller() {
    let srv = TestServer::spawn().await;
    let alice = srv.login_as("u1").await;
    let bob = srv.login_as("u2").await;

    srv.post_rating(&alice, json!({ "user_id": "u1", "movie_id": 1, "rating": 4 })).await;
    srv.post_rating(&alice, json!({ "user_id": "u1", "movie_id": 2, "rating": 2 })).await;
    srv.post_rating(&bob, json!({ "user_id": "u2", "movie_id": 1, "rating": 5 })).await;

    // Path user is not checked against the caller.
    let (status, body) = srv.get_json("/api/ratings/u1", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "movie_id": 1, "rating": 4 },
            { "movie_id": 2, "rating": 2 },
        ])
    );

    let (status, body) = srv.get_json("/api/ratings/nobody", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn watched_movies_are_recorded_without_authentication() {
    let srv = TestServer::spawn().await;

    let res = srv.post_watched(json!({ "user_id": "u1", "movie_id": 42, "rating": 4 })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: JsonValue = res.json().await.unwrap();
    assert_eq!(rows[0]["user_id"], "u1");
    assert_eq!(rows[0]["movie_id"], 42);
    assert_eq!(srv.store.len(Collection::WatchedMovies), 1);

    let res = srv.post_watched(json!({ "user_id": "u1" })).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "missing field: movie_id" }));
    assert_eq!(srv.store.len(Collection::WatchedMovies), 1);
}

#[tokio::test]
async fn watched_values_pass_through_unchecked() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_watched(json!({ "user_id": 12, "movie_id": "tt0111161", "rating": "loved it" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: JsonValue = res.json().await.unwrap();
    assert_eq!(rows[0]["user_id"], 12);
    assert_eq!(rows[0]["movie_id"], "tt0111161");
    assert_eq!(rows[0]["rating"], "loved it");
    assert_eq!(srv.store.len(Collection::WatchedMovies), 1);
}

#[tokio::test]
async fn users_directory_lists_registered_accounts() {
    let srv = TestServer::spawn().await;
    srv.login_as("u1").await;
    srv.login_as("u2").await;

    let res = srv.client.get(srv.url("/api/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: JsonValue = res.json().await.unwrap();
    let ids: Vec<&str> =
        users.as_array().unwrap().iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);
}

#[tokio::test]
async fn any_origin_is_allowed() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(srv.url("/api/users"))
        .header("Origin", "https://movies.example")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

// -------------------------
// Collaborator failures
// -------------------------

const STORE_DOWN: &str = "upstream connect error";

/// A record store that refuses every call.
struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn select(&self, _: Collection, _: &Query) -> Result<Vec<Row>, RecordStoreError> {
        Err(RecordStoreError::Transport(STORE_DOWN.to_string()))
    }

    async fn insert(&self, _: Collection, _: Vec<Row>) -> Result<Vec<Row>, RecordStoreError> {
        Err(RecordStoreError::Transport(STORE_DOWN.to_string()))
    }

    async fn upsert(
        &self,
        _: Collection,
        _: Vec<Row>,
        _: &[&str],
    ) -> Result<Vec<Row>, RecordStoreError> {
        Err(RecordStoreError::Rejected(STORE_DOWN.to_string()))
    }
}

/// Delegates to the in-memory provider, except that signing out fails.
struct StuckSession(Arc<InMemoryIdentity>);

#[async_trait]
impl IdentityProvider for StuckSession {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, IdentityError> {
        self.0.sign_up(credentials).await
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, IdentityError> {
        self.0.sign_in_with_password(credentials).await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Err(IdentityError::rejected("Session could not be revoked"))
    }

    async fn get_user(&self, token: &str) -> Result<AuthUser, IdentityError> {
        self.0.get_user(token).await
    }
}

/// An identity provider that cannot be reached at all.
struct Unreachable;

#[async_trait]
impl IdentityProvider for Unreachable {
    async fn sign_up(&self, _: &Credentials) -> Result<AuthResponse, IdentityError> {
        Err(IdentityError::transport("connection refused"))
    }

    async fn sign_in_with_password(&self, _: &Credentials) -> Result<AuthResponse, IdentityError> {
        Err(IdentityError::transport("connection refused"))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Err(IdentityError::transport("connection refused"))
    }

    async fn get_user(&self, _: &str) -> Result<AuthUser, IdentityError> {
        Err(IdentityError::transport("connection refused"))
    }
}

#[tokio::test]
async fn store_failures_are_server_errors_with_the_store_message() {
    let srv = TestServer::spawn_with(|identity, _| {
        AppServices::new(identity, Arc::new(FailingStore))
    })
    .await;
    let token = srv.login_as("u1").await;
    let expected = json!({ "error": STORE_DOWN });

    let res = srv.client.get(srv.url("/api/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<JsonValue>().await.unwrap(), expected);

    for path in ["/api/ratings/u1", "/api/ratings/u1/42"] {
        let (status, body) = srv.get_json(path, &token).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, expected);
    }

    let res = srv
        .post_rating(&token, json!({ "user_id": "u1", "movie_id": 42, "rating": 5 }))
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<JsonValue>().await.unwrap(), expected);

    let res = srv.post_watched(json!({ "user_id": "u1", "movie_id": 42, "rating": 4 })).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<JsonValue>().await.unwrap(), expected);
}

#[tokio::test]
async fn identity_failures_are_bad_requests_with_the_provider_message() {
    let srv = TestServer::spawn_with(|identity, store| {
        AppServices::new(Arc::new(StuckSession(identity)), store)
    })
    .await;
    let token = srv.login_as("u1").await;

    let res = srv
        .client
        .post(srv.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Session could not be revoked" }));

    let srv = TestServer::spawn_with(|_, store| AppServices::new(Arc::new(Unreachable), store))
        .await;
    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({ "email": "a@b.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "connection refused" }));
}
