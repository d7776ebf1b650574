//! Collection-based record store boundary.
//!
//! The gateway never owns rows: it reads and writes them through this
//! capability interface, backed either by memory (tests/dev) or by the hosted
//! backend's REST endpoint.

pub mod in_memory;
pub mod postgrest;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use postgrest::PostgrestStore;
pub use r#trait::{Filter, Query, RecordStore, RecordStoreError, Row};
