//! Records exchanged with the record store.
//!
//! Rows are owned by the store, which also owns their column types: apart
//! from the rating owner (checked against the caller), every value is
//! forwarded exactly as the client sent it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::UserId;
use crate::error::{DomainError, DomainResult};

/// A rating write, keyed by (`user_id`, `movie_id`).
///
/// A second write for the same pair overwrites `rating`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRating {
    pub user_id: UserId,
    pub movie_id: JsonValue,
    pub rating: JsonValue,
}

impl NewRating {
    pub fn to_row(&self) -> DomainResult<Map<String, JsonValue>> {
        to_row(self)
    }
}

/// A "watched" marker with the score given at the time.
///
/// Write-only from the gateway's point of view: nothing reads these back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWatchedMovie {
    pub user_id: JsonValue,
    pub movie_id: JsonValue,
    pub rating: JsonValue,
}

impl NewWatchedMovie {
    pub fn to_row(&self) -> DomainResult<Map<String, JsonValue>> {
        to_row(self)
    }
}

/// `{movie_id, rating}` projection returned when listing a user's ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub movie_id: JsonValue,
    pub rating: JsonValue,
}

impl RatingEntry {
    pub fn from_row(row: Map<String, JsonValue>) -> DomainResult<Self> {
        from_row(row)
    }
}

/// `{rating}` projection returned for a single (user, movie) lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingValue {
    pub rating: JsonValue,
}

impl RatingValue {
    pub fn from_row(row: Map<String, JsonValue>) -> DomainResult<Self> {
        from_row(row)
    }
}

fn to_row<T: Serialize>(value: &T) -> DomainResult<Map<String, JsonValue>> {
    match serde_json::to_value(value) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(DomainError::malformed(format!("expected an object, got {other}"))),
        Err(e) => Err(DomainError::malformed(e.to_string())),
    }
}

fn from_row<T: DeserializeOwned>(row: Map<String, JsonValue>) -> DomainResult<T> {
    serde_json::from_value(JsonValue::Object(row))
        .map_err(|e| DomainError::malformed(e.to_string()))
}
