//! Main controller task
//!
//! Owns the node state, the persistence layer and the LEDs. Applies events
//! one at a time, logs every outcome and escalates storage faults.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Instant;

use envnode_core::shell::Outcome;
use envnode_core::storage::PersistError;
use envnode_core::Node;
use envnode_hal::OutputPin;
use envnode_hal_stm32::Led;

use crate::channels::{ChannelSink, Event, EVENTS, FUSION_SETTINGS, FUSION_STATE, FUSION_STATE_REQUEST};
use crate::fault;
use crate::Storage;

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task(
    mut node: Node,
    mut storage: Storage,
    mut status_led: Led<'static>,
    mut fault_led: Led<'static>,
) {
    info!("Controller task started");

    let mut sink = ChannelSink;
    FUSION_SETTINGS.signal(node.fusion_settings());

    loop {
        match select(EVENTS.receive(), FUSION_STATE.wait()).await {
            Either::First(Event::Byte(byte)) => {
                let now_ms = Instant::now().as_millis();
                if let Some(outcome) = node.on_byte(byte, now_ms, &mut sink) {
                    log_outcome(&outcome);

                    if outcome.config_changed {
                        FUSION_SETTINGS.signal(node.fusion_settings());
                    }

                    if outcome.save_config {
                        match storage.save_config(node.config()) {
                            Ok(()) => info!("Configuration saved"),
                            Err(e) => handle_storage_error(e, &mut fault_led),
                        }
                    }
                }
            }

            Either::First(Event::Tick) => {
                storage.feed_watchdog();

                let tick = node.on_tick(&mut sink);
                tick.indicator.drive(&mut status_led);
                if tick.flushed {
                    trace!("Sample flushed");
                }
                if let Some(e) = tick.tx_error {
                    warn!("Sample not sent: {:?}", e);
                }
            }

            Either::First(Event::Fusion(output)) => {
                trace!("Fusion output: accuracy {}", output.iaq_accuracy);
                if node.on_fusion_output(&output) {
                    debug!("Fusion state save due");
                    FUSION_STATE_REQUEST.signal(());
                }
            }

            Either::Second(state) => {
                match storage.save_fusion_state(&state) {
                    Ok(()) => info!("Fusion state saved ({} bytes)", state.len()),
                    Err(e) => handle_storage_error(e, &mut fault_led),
                }
            }
        }
    }
}

/// Log what a shell line did
fn log_outcome(outcome: &Outcome) {
    debug!("Shell: {:?}", outcome);

    if outcome.line_overflowed {
        warn!("Shell line overflowed, excess bytes dropped");
    }
    if let Some(e) = outcome.parse_error {
        warn!("Malformed JSON: {:?}", e);
    }
    if outcome.rejected > 0 {
        warn!("{} value(s) rejected", outcome.rejected);
    }
    if outcome.unrecognized > 0 {
        debug!("{} unknown key(s) skipped", outcome.unrecognized);
    }
    if outcome.truncated {
        warn!("Reply truncated");
    }
    if let Some(e) = outcome.tx_error {
        warn!("Reply not sent: {:?}", e);
    }
}

/// Halt on fatal storage faults, log the rest
fn handle_storage_error<P: OutputPin>(error: PersistError, fault_led: &mut P) {
    if error.is_fatal() {
        fault::halt(fault_led, error);
    }
    warn!("Storage error: {:?}", error);
}
