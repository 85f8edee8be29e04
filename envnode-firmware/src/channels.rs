//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Everything that mutates node state goes through [`EVENTS`] and is applied
//! by the controller task alone.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use envnode_core::config::FusionSettings;
use envnode_core::fusion::StateBlob;
use envnode_core::report::FusionOutput;
use envnode_core::shell::Reply;
use envnode_hal::{ReplySink, TxError};

/// Channel capacity for run-loop events
const EVENT_CHANNEL_SIZE: usize = 32;

/// Channel capacity for outbound replies
const REPLY_CHANNEL_SIZE: usize = 4;

/// Events drained by the controller
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Byte received on the serial link
    Byte(u8),
    /// One-second tick
    Tick,
    /// New output from the fusion algorithm
    Fusion(FusionOutput),
}

/// Run-loop events (serial bytes, ticks, fusion outputs)
pub static EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> = Channel::new();

/// Replies waiting for the serial TX task
pub static REPLIES: Channel<CriticalSectionRawMutex, Reply, REPLY_CHANNEL_SIZE> = Channel::new();

/// Fusion settings (updated by controller at boot and after changes)
pub static FUSION_SETTINGS: Signal<CriticalSectionRawMutex, FusionSettings> = Signal::new();

/// Fusion state restored from flash at boot
pub static FUSION_BOOT_STATE: Signal<CriticalSectionRawMutex, StateBlob> = Signal::new();

/// Controller asks the fusion collaborator for its state
pub static FUSION_STATE_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Fusion state handed back for saving
pub static FUSION_STATE: Signal<CriticalSectionRawMutex, StateBlob> = Signal::new();

/// Reply sink feeding [`REPLIES`]
///
/// Never waits: a full queue reports [`TxError::Busy`].
pub struct ChannelSink;

impl ReplySink for ChannelSink {
    fn transmit(&mut self, data: &[u8]) -> Result<(), TxError> {
        let reply = Reply::from_slice(data).map_err(|_| TxError::TooLong)?;
        REPLIES.try_send(reply).map_err(|_| TxError::Busy)
    }
}
