//! Helpers shared by the reqwest adapters.

use reqwest::{Response, StatusCode};
use serde_json::Value as JsonValue;

/// Extract a human-readable error message from a failed backend response.
///
/// Looks for the first of `fields` holding a string in a JSON body, then falls
/// back to the raw body, then to the status reason phrase.
pub(crate) async fn error_message(resp: Response, fields: &[&str]) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    message_from_body(status, &body, fields)
}

pub(crate) fn message_from_body(status: StatusCode, body: &str, fields: &[&str]) -> String {
    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(body) {
        for field in fields {
            if let Some(JsonValue::String(msg)) = map.get(*field) {
                return msg.clone();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
