//! HTTP request relay with a bounded request history.
//!
//! The two core components are independent:
//! - [`relay::Relay`] executes a [`relay::RequestDescription`] and always
//!   returns a [`relay::ResponseEnvelope`], even when the call fails.
//! - [`history::HistoryStore`] keeps the most recent exchanges, newest first.
//!
//! The [`http`] module exposes both over a small JSON API.

// Core components
pub mod history;
pub mod relay;

// Boundary layer
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use history::{HistoryRecord, HistoryStore};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{Relay, RequestDescription, ResponseEnvelope};
