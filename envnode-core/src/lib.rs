//! Board-agnostic core logic for the sensor node firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Device configuration record and its invariants
//! - Block store and persistence codec over two reserved flash pages
//! - Command shell (single-character and JSON sub-protocols)
//! - Sample reporter and accuracy indicator
//! - Port driving the external sensor/fusion engine
//! - [`Node`], the run-loop context tying them together

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod fusion;
pub mod node;
pub mod report;
pub mod shell;
pub mod storage;

#[cfg(test)]
pub(crate) mod mock;

pub use config::DeviceConfig;
pub use node::Node;
