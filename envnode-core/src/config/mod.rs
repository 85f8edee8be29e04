//! Device configuration
//!
//! The configuration record is owned by the run loop and mutated only by the
//! command shell. It is persisted as postcard binary data, see
//! [`crate::storage::record`].

pub mod types;

pub use types::*;
