//! envnode Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the sensor node core
//! is written against. Chip-specific crates implement them; the core crate
//! provides host mocks for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (envnode-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  envnode-core (config, shell, storage)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  envnode-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ envnode-hal-  │
//!             │    stm32      │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::NorPages`] - Raw erase/program/read on reserved flash pages
//! - [`watchdog::Watchdog`] - Watchdog refresh
//! - [`gpio::OutputPin`] - Status and fault indicators
//! - [`uart::ReplySink`] - Outbound reply channel

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod gpio;
pub mod uart;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, NorPages, Page};
pub use gpio::OutputPin;
pub use uart::{ReplySink, TxError};
pub use watchdog::Watchdog;
