use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use yamaro_auth::Credentials;
use yamaro_core::{DomainError, DomainResult, NewRating, NewWatchedMovie, UserId};

// -------------------------
// Request DTOs
// -------------------------
//
// Fields are optional so that an absent field is reported through the
// endpoint's own error contract instead of a generic extractor rejection.
// Record fields stay raw JSON: the store owns their types.

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    pub fn into_credentials(self) -> DomainResult<Credentials> {
        Ok(Credentials::new(
            require(self.email, "email")?,
            require(self.password, "password")?,
        ))
    }
}

#[derive(Debug, Default)]
pub struct WatchedMovieRequest {
    pub user_id: Option<JsonValue>,
    pub movie_id: Option<JsonValue>,
    pub rating: Option<JsonValue>,
}

impl WatchedMovieRequest {
    pub fn from_json(body: JsonValue) -> Self {
        let mut fields = into_object(body);
        Self {
            user_id: take(&mut fields, "user_id"),
            movie_id: take(&mut fields, "movie_id"),
            rating: take(&mut fields, "rating"),
        }
    }

    pub fn into_record(self) -> DomainResult<NewWatchedMovie> {
        Ok(NewWatchedMovie {
            user_id: require(self.user_id, "user_id")?,
            movie_id: require(self.movie_id, "movie_id")?,
            rating: require(self.rating, "rating")?,
        })
    }
}

#[derive(Debug, Default)]
pub struct RatingRequest {
    pub user_id: Option<JsonValue>,
    pub movie_id: Option<JsonValue>,
    pub rating: Option<JsonValue>,
}

impl RatingRequest {
    pub fn from_json(body: JsonValue) -> Self {
        let mut fields = into_object(body);
        Self {
            user_id: take(&mut fields, "user_id"),
            movie_id: take(&mut fields, "movie_id"),
            rating: take(&mut fields, "rating"),
        }
    }

    /// The owner the payload claims. Anything but a string claims no one.
    pub fn claimed_owner(&self) -> Option<&str> {
        self.user_id.as_ref().and_then(JsonValue::as_str)
    }

    /// Build the row for `owner`, who must already have been checked
    /// against [`claimed_owner`](Self::claimed_owner).
    pub fn into_rating(self, owner: &UserId) -> DomainResult<NewRating> {
        Ok(NewRating {
            user_id: owner.clone(),
            movie_id: require(self.movie_id, "movie_id")?,
            rating: require(self.rating, "rating")?,
        })
    }
}

fn into_object(body: JsonValue) -> Map<String, JsonValue> {
    match body {
        JsonValue::Object(fields) => fields,
        _ => Map::new(),
    }
}

/// A JSON `null` counts as absent.
fn take(fields: &mut Map<String, JsonValue>, key: &str) -> Option<JsonValue> {
    fields.remove(key).filter(|v| !v.is_null())
}

fn require<T>(value: Option<T>, field: &'static str) -> DomainResult<T> {
    value.ok_or(DomainError::MissingField(field))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
