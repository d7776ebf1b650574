//! Infrastructure layer: adapters for the hosted identity and record store.
//!
//! Each collaborator has an in-memory implementation (tests/dev) and an HTTP
//! implementation talking to the hosted backend.

pub mod config;
pub mod identity;
pub mod record_store;

mod http;

pub use config::{BackendConfig, ConfigError};
pub use identity::{GoTrueIdentity, InMemoryIdentity};
pub use record_store::{
    Filter, InMemoryRecordStore, PostgrestStore, Query, RecordStore, RecordStoreError, Row,
};
