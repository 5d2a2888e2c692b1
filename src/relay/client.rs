//! Outbound execution of request descriptions.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode, Url};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::relay::error::{error_chain, RelayError, UpstreamHead};
use crate::relay::query::merge_query_params;
use crate::relay::request::RequestDescription;
use crate::relay::response::{decode_body, headers_to_json, status_text, ResponseEnvelope};

/// Executes [`RequestDescription`]s against the network.
///
/// Holds no per-call state; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Relay {
    client: Client,
}

/// Fully buffered upstream response.
struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Relay {
    /// Create a relay with the configured redirect limit and user agent.
    ///
    /// The user agent is a default: a `User-Agent` header in the request
    /// description takes precedence.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let mut builder = Client::builder().redirect(redirect::Policy::limited(config.max_redirects));
        if !config.user_agent.is_empty() {
            builder = builder.user_agent(config.user_agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::Client(error_chain(&e)))?;

        Ok(Self { client })
    }

    /// Execute a request and return its envelope.
    ///
    /// Never fails: transport failures become a failure envelope with
    /// status 500 (or the upstream status when one was received) and size 0.
    /// Every upstream status code, 4xx and 5xx included, is a normal result.
    pub async fn execute(&self, request: RequestDescription) -> ResponseEnvelope {
        let started = Instant::now();
        let url = merge_query_params(&request.url, &request.params);

        tracing::debug!(
            method = %request.method,
            url = %url,
            "Relaying request"
        );

        let outcome = self.dispatch(&request, &url).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(upstream) => {
                let envelope = ResponseEnvelope::from_upstream(
                    upstream.status,
                    &upstream.headers,
                    &upstream.body,
                    elapsed,
                );
                tracing::info!(
                    method = %request.method,
                    url = %url,
                    status = envelope.status,
                    response_time_ms = envelope.response_time,
                    size = envelope.size,
                    "Request relayed"
                );
                metrics::record_relay_call(
                    request.method.as_str(),
                    envelope.status,
                    "completed",
                    elapsed,
                );
                envelope
            }
            Err(err) => {
                let envelope = ResponseEnvelope::failure(&err, elapsed);
                tracing::warn!(
                    method = %request.method,
                    url = %url,
                    kind = err.kind(),
                    error = %err,
                    response_time_ms = envelope.response_time,
                    "Relay failed"
                );
                metrics::record_relay_call(
                    request.method.as_str(),
                    envelope.status,
                    err.kind(),
                    elapsed,
                );
                envelope
            }
        }
    }

    /// Execute a request, giving up after `deadline`.
    ///
    /// An expired deadline is reported like any other transport failure:
    /// a failure envelope with status 500 and size 0.
    pub async fn execute_within(
        &self,
        request: RequestDescription,
        deadline: Duration,
    ) -> ResponseEnvelope {
        let started = Instant::now();
        let method = request.method.clone();
        let url = merge_query_params(&request.url, &request.params);

        match tokio::time::timeout(deadline, self.execute(request)).await {
            Ok(envelope) => envelope,
            Err(_) => {
                let elapsed = started.elapsed();
                let err = RelayError::Timeout(format!(
                    "no response within {} ms",
                    deadline.as_millis()
                ));
                let envelope = ResponseEnvelope::failure(&err, elapsed);
                tracing::warn!(
                    method = %method,
                    url = %url,
                    kind = err.kind(),
                    error = %err,
                    response_time_ms = envelope.response_time,
                    "Relay deadline expired"
                );
                metrics::record_relay_call(method.as_str(), envelope.status, err.kind(), elapsed);
                envelope
            }
        }
    }

    /// Single attempt at the upstream call.
    async fn dispatch(
        &self,
        request: &RequestDescription,
        url: &str,
    ) -> Result<UpstreamResponse, RelayError> {
        let method = request.method.to_reqwest()?;
        let target = Url::parse(url).map_err(|e| RelayError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = request.header_map()?;

        let mut builder = self.client.request(method, target);
        match &request.body {
            None => {}
            Some(Value::String(text)) => {
                builder = builder.body(text.clone());
            }
            Some(structured) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                builder = builder.body(structured.to_string());
            }
        }

        let mut response = builder
            .headers(headers)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        let status = response.status();
        let response_headers = response.headers().clone();

        // Read chunk by chunk so a body cut short still reports what arrived.
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => {
                    return Ok(UpstreamResponse {
                        status,
                        headers: response_headers,
                        body,
                    })
                }
                Err(e) => {
                    return Err(RelayError::Body {
                        head: UpstreamHead {
                            status: status.as_u16(),
                            status_text: status_text(status),
                            headers: headers_to_json(&response_headers),
                            detail: (!body.is_empty()).then(|| decode_body(&body)),
                        },
                        message: error_chain(&e),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use serde_json::json;

    fn relay() -> Relay {
        Relay::new(&RelayConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_url_becomes_failure_envelope() {
        let envelope = relay()
            .execute(RequestDescription::new("GET", "not a url"))
            .await;

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.status_text, "Error");
        assert_eq!(envelope.size, 0);
        assert!(envelope.error_message().unwrap().starts_with("Invalid URL"));
    }

    #[tokio::test]
    async fn test_invalid_method_becomes_failure_envelope() {
        let envelope = relay()
            .execute(RequestDescription::new("NOT VALID", "http://127.0.0.1:9/"))
            .await;

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.body["error"], json!("Invalid HTTP method 'NOT VALID'"));
    }

    #[tokio::test]
    async fn test_expired_deadline_becomes_failure_envelope() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let envelope = relay()
            .execute_within(
                RequestDescription::new("GET", format!("http://{addr}/")),
                Duration::from_millis(200),
            )
            .await;

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.status_text, "Error");
        assert_eq!(envelope.size, 0);
        assert_eq!(
            envelope.error_message(),
            Some("Request timed out: no response within 200 ms")
        );
        assert!(envelope.response_time >= 200);
    }

    #[tokio::test]
    async fn test_connection_refused_is_folded() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let envelope = relay()
            .execute(RequestDescription::new("GET", format!("http://{addr}/")))
            .await;

        assert!(envelope.status >= 500);
        assert_eq!(envelope.size, 0);
        assert!(envelope.error_message().is_some());
        assert!(envelope.headers.is_empty());
    }
}
