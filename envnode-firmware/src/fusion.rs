//! Fusion collaborator glue
//!
//! Connects a [`FusionEngine`] to the run loop through the static channels.
//! The port logic itself lives in `envnode_core::fusion`.

use defmt::*;

use envnode_core::config::FusionSettings;
use envnode_core::fusion::{FusionEngine, FusionEvent, FusionLink, FusionPort, StateBlob};
use envnode_core::report::FusionOutput;

use crate::channels::{
    Event, EVENTS, FUSION_BOOT_STATE, FUSION_SETTINGS, FUSION_STATE, FUSION_STATE_REQUEST,
};

/// [`FusionLink`] over the static signals and the event queue
pub struct ChannelLink;

impl FusionLink for ChannelLink {
    async fn settings(&self) -> FusionSettings {
        FUSION_SETTINGS.wait().await
    }

    async fn state_request(&self) {
        FUSION_STATE_REQUEST.wait().await
    }

    fn boot_state(&self) -> Option<StateBlob> {
        FUSION_BOOT_STATE.try_take()
    }

    fn publish(&self, output: FusionOutput) -> bool {
        EVENTS.try_send(Event::Fusion(output)).is_ok()
    }

    fn save_state(&self, state: StateBlob) {
        FUSION_STATE.signal(state);
    }
}

/// Drive a fusion engine for the lifetime of the firmware
pub async fn run<E: FusionEngine>(engine: E) -> ! {
    let mut port = FusionPort::new(engine, ChannelLink);
    if port.start().await {
        info!("Fusion state restored");
    }

    loop {
        match port.step().await {
            FusionEvent::Output { delivered: false } => {
                warn!("Event channel full, dropping fusion output");
            }
            FusionEvent::Output { delivered: true } => {}
            FusionEvent::Configured => debug!("Fusion settings applied"),
            FusionEvent::StateSaved { len } => debug!("Fusion state snapshot ({} bytes)", len),
        }
    }
}
