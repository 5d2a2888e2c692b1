//! Declarative description of an outbound HTTP call.

use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::relay::error::RelayError;

/// HTTP verb of a relayed request.
///
/// Parsing is case-insensitive. Verbs outside the common set are kept
/// (upper-cased) as `Other` and checked for token validity when the
/// request is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }

    /// Convert to the client's method type.
    pub fn to_reqwest(&self) -> Result<reqwest::Method, RelayError> {
        match self {
            HttpMethod::Get => Ok(reqwest::Method::GET),
            HttpMethod::Post => Ok(reqwest::Method::POST),
            HttpMethod::Put => Ok(reqwest::Method::PUT),
            HttpMethod::Patch => Ok(reqwest::Method::PATCH),
            HttpMethod::Delete => Ok(reqwest::Method::DELETE),
            HttpMethod::Head => Ok(reqwest::Method::HEAD),
            HttpMethod::Options => Ok(reqwest::Method::OPTIONS),
            HttpMethod::Other(verb) => reqwest::Method::from_bytes(verb.as_bytes())
                .map_err(|_| RelayError::InvalidMethod(verb.clone())),
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(value: &str) -> Self {
        let verb = value.trim().to_ascii_uppercase();
        match verb.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(verb),
        }
    }
}

impl From<String> for HttpMethod {
    fn from(value: String) -> Self {
        HttpMethod::from(value.as_str())
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Other(verb) => verb,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP call to be executed by the relay.
///
/// Header and parameter maps keep insertion order, so the query string
/// produced from `params` follows the order the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescription {
    pub method: HttpMethod,

    /// Target URL; may already carry a query string.
    pub url: String,

    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub headers: IndexMap<String, String>,

    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub params: IndexMap<String, String>,

    /// Structured JSON or raw text (a JSON string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestDescription {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: IndexMap::new(),
            params: IndexMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Check the preconditions the relay expects the boundary to enforce.
    ///
    /// URL syntax is deliberately not checked here: an unparseable URL is a
    /// relay failure and is reported through the failure envelope.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.url.trim().is_empty() {
            return Err(RelayError::MissingUrl);
        }
        self.method.to_reqwest()?;
        self.header_map()?;
        Ok(())
    }

    /// Build the outbound header map.
    pub fn header_map(&self) -> Result<HeaderMap, RelayError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| RelayError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| RelayError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}
