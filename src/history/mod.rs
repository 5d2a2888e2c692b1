//! Bounded request history subsystem.
//!
//! # Data Flow
//! ```text
//! (RequestDescription, ResponseEnvelope)
//!     → store.rs add (new id + timestamp, push front, truncate to capacity)
//!     → record.rs HistoryRecord (immutable)
//!
//! list / get_by_id / delete_by_id / clear
//!     → store.rs (single mutex over the ordered collection)
//! ```
//!
//! # Design Decisions
//! - In-memory only; the store is empty at process start
//! - Order is kept by position in the collection, not by id or timestamp
//! - Lookup and delete are linear scans over at most `capacity` records

pub mod record;
pub mod store;

pub use record::HistoryRecord;
pub use store::{HistoryStore, DEFAULT_CAPACITY};
