//! `yamaro-core` — domain values shared by the gateway crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).
//! Records are owned by the hosted backend; the types here only describe the
//! shapes the gateway reads and writes.

pub mod collection;
pub mod error;
pub mod id;
pub mod model;

pub use collection::Collection;
pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use model::{NewRating, NewWatchedMovie, RatingEntry, RatingValue};
