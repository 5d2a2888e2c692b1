//! Client SDK for the request relay service.

pub mod client;

pub use client::{HistoryItem, RelayClient, RelayResponse, SendRequest};
