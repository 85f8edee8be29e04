//! Serial transmit task
//!
//! Writes queued replies and samples to the serial link.

use defmt::*;
use embassy_stm32::usart::BufferedUartTx;
use embedded_io_async::Write;

use envnode_hal_stm32::uart::UartBusError;

use crate::channels::REPLIES;

/// Serial TX task - drains the reply channel
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx<'static>) {
    info!("Serial TX task started");

    loop {
        let reply = REPLIES.receive().await;

        if let Err(e) = tx.write_all(&reply).await {
            warn!("Failed to send reply: {:?}", UartBusError::from(e));
        } else {
            trace!("TX: {} bytes", reply.len());
        }
    }
}
