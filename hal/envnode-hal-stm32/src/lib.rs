//! STM32L4-specific HAL for the envnode firmware
//!
//! This crate implements the `envnode-hal` traits on top of embassy-stm32:
//!
//! - [`flash::Stm32Pages`] - the two reserved flash pages
//! - [`watchdog::Iwdg`] - independent watchdog
//! - [`gpio::Led`] - status and fault LEDs
//!
//! # Features
//!
//! - `stm32l432kc` - Enable support for STM32L432KC
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod flash;
pub mod gpio;
pub mod uart;
pub mod watchdog;

pub use flash::Stm32Pages;
pub use gpio::Led;
pub use watchdog::Iwdg;
