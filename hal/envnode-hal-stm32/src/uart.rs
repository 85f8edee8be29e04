//! Serial link for STM32L4
//!
//! Provides the USART settings and error mapping for the command shell link.

use embassy_stm32::usart::{Config, Error as UsartError};

/// Shell link baud rate
pub const SERIAL_BAUDRATE: u32 = 115_200;

/// USART configuration for the shell link (8N1)
pub fn serial_config() -> Config {
    let mut config = Config::default();
    config.baudrate = SERIAL_BAUDRATE;
    config
}

/// Error from UART operations
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBusError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Overrun error
    Overrun,
    /// Parity error
    Parity,
    /// Buffer too small
    BufferTooSmall,
    /// Other error
    Other,
}

impl From<UsartError> for UartBusError {
    fn from(e: UsartError) -> Self {
        match e {
            UsartError::Framing => UartBusError::Framing,
            UsartError::Noise => UartBusError::Noise,
            UsartError::Overrun => UartBusError::Overrun,
            UsartError::Parity => UartBusError::Parity,
            UsartError::BufferTooLong => UartBusError::BufferTooSmall,
            _ => UartBusError::Other,
        }
    }
}
