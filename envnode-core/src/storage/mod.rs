//! Non-volatile storage
//!
//! Layered bottom-up:
//!
//! - [`block`] - erase/program/read over the reserved pages, watchdog-safe
//! - [`codec`] - magic + length framing, validated on load
//! - [`record`] - the configuration record as postcard data
//! - [`schedule`] - when to save the fusion state

pub mod block;
pub mod codec;
pub mod record;
pub mod schedule;

pub use block::{BlockStore, PageWriter, StoreError};
pub use codec::{PersistError, Persistence};
pub use record::{decode_config, encode_config, CONFIG_VERSION};
pub use schedule::{SaveInterval, STATE_SAVE_INTERVAL};
