use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request description accepted by `POST /proxy/send`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendRequest {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl SendRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Response envelope returned by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Map<String, Value>,
    pub data: Value,
    pub response_time: u64,
    pub size: usize,
}

/// A recorded exchange as returned by the history endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub response: Option<RelayResponse>,
    pub timestamp: String,
}

pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Relay a request. Upstream failures still arrive as `Ok` envelopes.
    pub async fn send(&self, req: &SendRequest) -> Result<RelayResponse, Box<dyn std::error::Error>> {
        let resp = self.client
            .post(format!("{}/proxy/send", self.base_url))
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Relay returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Record an exchange.
    pub async fn add_history(
        &self,
        req: &SendRequest,
        response: Option<&RelayResponse>,
    ) -> Result<HistoryItem, reqwest::Error> {
        self.client
            .post(format!("{}/history", self.base_url))
            .json(&serde_json::json!({ "request": req, "response": response }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// All records, most recent first.
    pub async fn history(&self) -> Result<Vec<HistoryItem>, reqwest::Error> {
        self.client
            .get(format!("{}/history", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// One record, or `None` when the service answers with an empty body.
    pub async fn history_item(&self, id: &str) -> Result<Option<HistoryItem>, Box<dyn std::error::Error>> {
        let text = self.client
            .get(format!("{}/history/{}", self.base_url, id))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    pub async fn delete_history_item(&self, id: &str) -> Result<StatusCode, reqwest::Error> {
        let resp = self.client
            .delete(format!("{}/history/{}", self.base_url, id))
            .send()
            .await?;
        Ok(resp.status())
    }

    pub async fn clear_history(&self) -> Result<StatusCode, reqwest::Error> {
        let resp = self.client
            .delete(format!("{}/history", self.base_url))
            .send()
            .await?;
        Ok(resp.status())
    }

    pub async fn health(&self) -> Result<Value, reqwest::Error> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
