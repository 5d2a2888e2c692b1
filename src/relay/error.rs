//! Relay failure classification.

use serde_json::{Map, Value};
use thiserror::Error;

/// Status, headers and body detail reported by the upstream before a
/// failure cut the exchange short.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamHead {
    pub status: u16,
    pub status_text: String,
    pub headers: Map<String, Value>,
    pub detail: Option<Value>,
}

/// Errors that prevent a relayed call from completing.
///
/// None of these escape [`Relay::execute`](crate::relay::Relay::execute);
/// they are folded into a failure [`ResponseEnvelope`](crate::relay::ResponseEnvelope).
/// The boundary layer also uses the request-shape variants to reject input
/// before it reaches the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request description carried no URL.
    #[error("URL is required")]
    MissingUrl,

    /// The resolved URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The method is not a valid HTTP token.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// A header name or value is not valid HTTP syntax.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// DNS resolution or TCP/TLS connection failed.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The network stack gave up waiting.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The redirect limit was exceeded or a redirect loop was detected.
    #[error("Redirect failed: {0}")]
    Redirect(String),

    /// The upstream sent a response head but the body could not be read.
    #[error("Failed to read response body: {message}")]
    Body { head: UpstreamHead, message: String },

    /// Any other transport-level failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client initialisation failed: {0}")]
    Client(String),
}

impl RelayError {
    /// Classify a transport error raised while sending a request.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_timeout() {
            RelayError::Timeout(message)
        } else if err.is_connect() {
            RelayError::Connect(message)
        } else if err.is_redirect() {
            RelayError::Redirect(message)
        } else {
            RelayError::Transport(message)
        }
    }

    /// The upstream response head, if one was received before the failure.
    pub fn upstream(&self) -> Option<&UpstreamHead> {
        match self {
            RelayError::Body { head, .. } => Some(head),
            _ => None,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingUrl => "missing_url",
            RelayError::InvalidUrl { .. } => "invalid_url",
            RelayError::InvalidMethod(_) => "invalid_method",
            RelayError::InvalidHeader { .. } => "invalid_header",
            RelayError::Connect(_) => "connect",
            RelayError::Timeout(_) => "timeout",
            RelayError::Redirect(_) => "redirect",
            RelayError::Body { .. } => "body",
            RelayError::Transport(_) => "transport",
            RelayError::Client(_) => "client",
        }
    }
}

/// Render an error and its source chain as one line.
///
/// reqwest's top-level message only names the URL; the cause
/// ("Connection refused", "dns error") lives further down the chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_causes() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert_eq!(error_chain(&err), "outer: Connection refused");
    }

    #[test]
    fn test_error_display() {
        let err = RelayError::InvalidHeader {
            name: "bad header".into(),
            reason: "invalid HTTP header name".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid header 'bad header': invalid HTTP header name"
        );
        assert_eq!(RelayError::MissingUrl.to_string(), "URL is required");
    }

    #[test]
    fn test_upstream_only_for_body_failures() {
        let head = UpstreamHead {
            status: 502,
            status_text: "Bad Gateway".into(),
            headers: Map::new(),
            detail: None,
        };
        let err = RelayError::Body {
            head: head.clone(),
            message: "connection reset".into(),
        };
        assert_eq!(err.upstream(), Some(&head));
        assert!(RelayError::Connect("refused".into()).upstream().is_none());
        assert_eq!(err.kind(), "body");
    }
}
