use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use yamaro_core::Collection;

/// A record as stored: a flat JSON object.
pub type Row = Map<String, JsonValue>;

/// A single predicate on a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: JsonValue },
}

/// Read request: an optional column projection and a conjunction of filters.
///
/// ```ignore
/// let q = Query::columns(&["rating", "movie_id"]).where_eq("user_id", "u1");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
}

impl Query {
    /// Every column of every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict returned rows to the named columns.
    pub fn columns(columns: &[&str]) -> Self {
        Self {
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            filters: Vec::new(),
        }
    }

    /// Add an equality filter.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }
}

/// Record store operation error.
///
/// Display strings are surfaced to HTTP callers, so they read like the
/// messages of the hosted store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    /// The store rejected the operation (constraint, malformed filter, ...).
    #[error("{0}")]
    Rejected(String),

    /// A single row was requested but zero or several matched.
    #[error("JSON object requested, multiple (or no) rows returned")]
    NotSingle(usize),

    /// An upserted row did not carry every conflict key.
    #[error("null value in column \"{0}\" violates not-null constraint")]
    MissingConflictKey(String),

    /// The store could not be reached or answered with garbage.
    #[error("{0}")]
    Transport(String),
}

/// Create/read/upsert access to named collections.
///
/// ## Semantics
///
/// - `select` returns matching rows, projected to `query.columns` if set.
/// - `insert` appends rows and returns them as stored.
/// - `upsert` writes each row, overwriting the existing row whose
///   `conflict_keys` values are equal (last write wins), and returns the rows
///   as stored, in input order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Row>, RecordStoreError>;

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, RecordStoreError>;

    async fn upsert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, RecordStoreError>;

    /// Select exactly one row; zero or several matches is an error.
    async fn select_single(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Row, RecordStoreError> {
        let mut rows = self.select(collection, query).await?;
        if rows.len() != 1 {
            return Err(RecordStoreError::NotSingle(rows.len()));
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl<S> RecordStore for std::sync::Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn select(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Row>, RecordStoreError> {
        (**self).select(collection, query).await
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, RecordStoreError> {
        (**self).insert(collection, rows).await
    }

    async fn upsert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, RecordStoreError> {
        (**self).upsert(collection, rows, conflict_keys).await
    }

    async fn select_single(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Row, RecordStoreError> {
        (**self).select_single(collection, query).await
    }
}
