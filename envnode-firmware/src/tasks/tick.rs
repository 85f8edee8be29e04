//! Tick task for time-based updates
//!
//! Provides the one-second tick that drives:
//! - Sample counting and flushing in the reporter
//! - Accuracy indicator blinking
//! - Watchdog refresh

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::{Event, EVENTS};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Tick task - queues a tick event every second
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;

        if EVENTS.try_send(Event::Tick).is_err() {
            warn!("Event channel full, dropping tick");
        }
    }
}
