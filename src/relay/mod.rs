//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescription (method, url, headers, params, body)
//!     → query.rs (append params to the URL query string)
//!     → client.rs (build reqwest request, single attempt, any status accepted)
//!     → response.rs (decode body, measure size and elapsed time)
//!     → ResponseEnvelope
//!
//! On transport failure:
//!     error.rs (classify reqwest error)
//!     → response.rs (failure envelope: status 500 or upstream status, size 0)
//! ```
//!
//! # Design Decisions
//! - `Relay::execute` is total: every failure becomes an envelope
//! - Upstream 4xx/5xx responses are pass-through, not errors
//! - No retries or backoff; `execute` sets no timeout, `execute_within`
//!   races it against a deadline the caller supplies
//! - Stateless apart from the pooled `reqwest::Client`

pub mod client;
pub mod error;
pub mod query;
pub mod request;
pub mod response;

pub use client::Relay;
pub use error::RelayError;
pub use query::merge_query_params;
pub use request::{HttpMethod, RequestDescription};
pub use response::ResponseEnvelope;
