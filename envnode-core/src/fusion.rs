//! Fusion collaborator port
//!
//! The sensor driver and the fusion algorithm are linked in separately as a
//! [`FusionEngine`]. [`FusionPort`] drives one: settings and the restored
//! state flow in through a [`FusionLink`], outputs and state snapshots flow
//! out through it.

use embassy_futures::select::{select3, Either3};
use heapless::Vec;

use crate::config::FusionSettings;
use crate::report::FusionOutput;

/// Largest fusion state blob
pub const MAX_STATE_LEN: usize = 512;

/// Opaque fusion algorithm state
pub type StateBlob = Vec<u8, MAX_STATE_LEN>;

/// Sensor plus fusion algorithm
#[allow(async_fn_in_trait)]
pub trait FusionEngine {
    /// Apply the temperature offset and channel selection
    fn configure(&mut self, settings: &FusionSettings);

    /// Restore a state blob saved earlier
    fn restore_state(&mut self, state: &[u8]);

    /// Serialize the current state into `buf`, returning its length
    fn snapshot_state(&mut self, buf: &mut [u8]) -> usize;

    /// Run until the next output is available
    async fn next_output(&mut self) -> FusionOutput;
}

/// Connection between the engine and the run loop
#[allow(async_fn_in_trait)]
pub trait FusionLink {
    /// Wait for new settings
    async fn settings(&self) -> FusionSettings;

    /// Wait until the run loop asks for a state snapshot
    async fn state_request(&self);

    /// State restored from flash at boot, if any
    fn boot_state(&self) -> Option<StateBlob>;

    /// Hand an output to the run loop; `false` if it was dropped
    fn publish(&self, output: FusionOutput) -> bool;

    /// Hand a state snapshot to the run loop for saving
    fn save_state(&self, state: StateBlob);
}

/// What one [`FusionPort::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FusionEvent {
    /// An output was produced
    Output { delivered: bool },
    /// New settings were applied
    Configured,
    /// A snapshot of `len` bytes was handed over
    StateSaved { len: usize },
}

/// Drives a [`FusionEngine`] over a [`FusionLink`]
pub struct FusionPort<E, L> {
    engine: E,
    link: L,
}

impl<E: FusionEngine, L: FusionLink> FusionPort<E, L> {
    pub fn new(engine: E, link: L) -> Self {
        Self { engine, link }
    }

    /// Wait for the first settings and restore the boot state
    ///
    /// Returns `true` if a saved state was restored.
    pub async fn start(&mut self) -> bool {
        let settings = self.link.settings().await;
        self.engine.configure(&settings);

        match self.link.boot_state() {
            Some(state) => {
                self.engine.restore_state(&state);
                true
            }
            None => false,
        }
    }

    /// Handle whichever of output, settings or state request comes first
    pub async fn step(&mut self) -> FusionEvent {
        let Self { engine, link } = self;
        let event = select3(engine.next_output(), link.settings(), link.state_request()).await;

        match event {
            Either3::First(output) => FusionEvent::Output {
                delivered: link.publish(output),
            },
            Either3::Second(settings) => {
                engine.configure(&settings);
                FusionEvent::Configured
            }
            Either3::Third(()) => {
                let mut state = StateBlob::new();
                // Capacity is fixed, so this cannot fail
                let _ = state.resize(MAX_STATE_LEN, 0);
                let len = engine.snapshot_state(&mut state).min(MAX_STATE_LEN);
                state.truncate(len);
                link.save_state(state);
                FusionEvent::StateSaved { len }
            }
        }
    }
}
