//! Stored request/response pairs.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::relay::{HttpMethod, RequestDescription, ResponseEnvelope};

/// A recorded exchange.
///
/// Carries a copy of the request fields flattened alongside the optional
/// response envelope. Records are never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// UUID v4, unique for the lifetime of the process.
    pub id: String,

    pub method: HttpMethod,
    pub url: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseEnvelope>,

    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a record with a fresh identifier and the current time.
    pub fn new(request: RequestDescription, response: Option<ResponseEnvelope>) -> Self {
        let RequestDescription {
            method,
            url,
            headers,
            params,
            body,
        } = request;

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            url,
            headers,
            body,
            params,
            response,
            timestamp: Utc::now(),
        }
    }

    /// Rebuild the request description this record was created from.
    pub fn request(&self) -> RequestDescription {
        RequestDescription {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
        }
    }
}
