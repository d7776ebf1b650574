//! Record store backed by the hosted backend's REST interface (`/rest/v1`).
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `select`  | `GET /rest/v1/{collection}?select=a,b&col=eq.value` |
//! | `insert`  | `POST /rest/v1/{collection}` + `Prefer: return=representation` |
//! | `upsert`  | `POST /rest/v1/{collection}?on_conflict=k1,k2` + merge-duplicates `Prefer` |

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value as JsonValue;
use tracing::instrument;

use yamaro_core::Collection;

use super::r#trait::{Filter, Query, RecordStore, RecordStoreError, Row};
use crate::config::BackendConfig;
use crate::http;

const ERROR_FIELDS: &[&str] = &["message", "error", "hint"];

/// REST-backed record store.
///
/// Cheap to clone; `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, collection))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(resp: Result<Response, reqwest::Error>) -> Result<Vec<Row>, RecordStoreError> {
        let resp = resp.map_err(|e| RecordStoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RecordStoreError::Rejected(http::error_message(resp, ERROR_FIELDS).await));
        }
        resp.json::<Vec<Row>>()
            .await
            .map_err(|e| RecordStoreError::Transport(format!("unreadable response: {e}")))
    }
}

/// Render query parameters in the REST dialect (`select=...`, `col=eq.value`).
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let select = query
        .columns
        .as_ref()
        .map(|c| c.join(","))
        .unwrap_or_else(|| "*".to_string());

    let mut params = vec![("select".to_string(), select)];
    for filter in &query.filters {
        match filter {
            Filter::Eq { column, value } => {
                params.push((column.clone(), format!("eq.{}", render_value(value))));
            }
        }
    }
    params
}

fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn select(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Row>, RecordStoreError> {
        let resp = self
            .request(Method::GET, collection)
            .query(&query_params(query))
            .send()
            .await;
        Self::rows(resp).await
    }

    #[instrument(skip(self, rows), fields(collection = %collection, rows = rows.len()))]
    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, RecordStoreError> {
        let resp = self
            .request(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await;
        Self::rows(resp).await
    }

    #[instrument(skip(self, rows), fields(collection = %collection, rows = rows.len()))]
    async fn upsert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, RecordStoreError> {
        let resp = self
            .request(Method::POST, collection)
            .query(&[("on_conflict", conflict_keys.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows)
            .send()
            .await;
        Self::rows(resp).await
    }
}
