//! Identity provider adapters.

pub mod gotrue;
pub mod in_memory;

pub use gotrue::GoTrueIdentity;
pub use in_memory::InMemoryIdentity;
