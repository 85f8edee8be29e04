//! Serial receive task
//!
//! Forwards every received byte to the controller. Line assembly happens in
//! the run loop, not here.

use defmt::*;
use embassy_stm32::usart::BufferedUartRx;
use embedded_io_async::Read;

use envnode_hal_stm32::uart::UartBusError;

use crate::channels::{Event, EVENTS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Serial RX task - queues received bytes as events
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx<'static>) {
    info!("Serial RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    if EVENTS.try_send(Event::Byte(byte)).is_err() {
                        warn!("Event channel full, dropping byte");
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", UartBusError::from(e));
            }
        }
    }
}
