//! Normalized result of a relayed call.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::relay::error::RelayError;

/// Status used when a failure produced no upstream status.
pub const FAILURE_STATUS: u16 = 500;

/// Status text used when a failure produced no upstream status text.
pub const FAILURE_STATUS_TEXT: &str = "Error";

/// Uniform response produced by the relay for both upstream responses and
/// transport failures.
///
/// `size` is fixed at construction from the body's serialized form and is
/// never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: u16,

    #[serde(default)]
    pub status_text: String,

    /// Header name to a string, or an array of strings for repeated headers.
    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Upstream body: structured JSON when it parsed, raw text otherwise.
    #[serde(rename = "data", default)]
    pub body: Value,

    /// Milliseconds from the start of the call to completion or failure.
    #[serde(default)]
    pub response_time: u64,

    /// Byte length of the serialized body; 0 on the failure path.
    #[serde(default)]
    pub size: usize,
}

impl ResponseEnvelope {
    /// Build an envelope from a complete upstream response.
    pub fn from_upstream(
        status: StatusCode,
        headers: &HeaderMap,
        raw_body: &[u8],
        elapsed: Duration,
    ) -> Self {
        let body = decode_body(raw_body);
        let size = payload_size(&body);
        Self {
            status: status.as_u16(),
            status_text: status_text(status),
            headers: headers_to_json(headers),
            body,
            response_time: millis(elapsed),
            size,
        }
    }

    /// Build the failure envelope for an exchange that could not complete.
    pub fn failure(error: &RelayError, elapsed: Duration) -> Self {
        let upstream = error.upstream();

        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(error.to_string()));
        if let Some(detail) = upstream.and_then(|head| head.detail.clone()) {
            body.insert("details".to_string(), detail);
        }

        Self {
            status: upstream.map_or(FAILURE_STATUS, |head| head.status),
            status_text: upstream
                .map(|head| head.status_text.clone())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| FAILURE_STATUS_TEXT.to_string()),
            headers: upstream.map(|head| head.headers.clone()).unwrap_or_default(),
            body: Value::Object(body),
            response_time: millis(elapsed),
            size: 0,
        }
    }

    /// Error message carried by a failure envelope.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Decode an upstream body: JSON when it parses, otherwise the text itself.
pub fn decode_body(raw: &[u8]) -> Value {
    let text = String::from_utf8_lossy(raw);
    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
}

/// Byte length of a payload's canonical textual form.
///
/// Text is measured as is; anything structured is measured as compact JSON.
pub fn payload_size(body: &Value) -> usize {
    match body {
        Value::String(text) => text.len(),
        other => other.to_string().len(),
    }
}

/// Reason phrase for a status code, empty for non-standard codes.
pub fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Convert response headers to JSON, collapsing repeats into arrays.
pub fn headers_to_json(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            json!(values)
        };
        map.insert(name.as_str().to_string(), value);
    }
    map
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
