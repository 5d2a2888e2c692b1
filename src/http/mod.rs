//! HTTP boundary layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing, timeout, body limit, CORS)
//!     → proxy.rs   POST /proxy/send   → relay::Relay::execute
//!     → history.rs /history[/{id}]    → history::HistoryStore
//!     → health.rs  GET /health
//!     → JSON response (errors via error.rs)
//! ```
//!
//! # Design Decisions
//! - Handlers hold no logic beyond validation and (de)serialization
//! - Relay failures are ordinary 200 responses carrying a failure envelope;
//!   only structurally invalid input is answered with a 4xx
//! - Relay and history are independent: recording an exchange is a separate
//!   `POST /history` call by the client

pub mod error;
pub mod health;
pub mod history;
pub mod proxy;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
