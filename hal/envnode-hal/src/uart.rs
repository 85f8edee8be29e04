//! Reply channel abstraction
//!
//! Replies and samples leave the node through a byte sink. On the board
//! this is the serial link; the transport may be momentarily busy.

/// Errors from the reply sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxError {
    /// Transport is busy, the reply was not queued (recoverable)
    Busy,
    /// Reply does not fit the transport buffer
    TooLong,
}

/// Outbound reply sink
pub trait ReplySink {
    /// Queue `data` for transmission
    ///
    /// Returns [`TxError::Busy`] if the transport cannot accept it right
    /// now. The reply is dropped in that case; callers log and carry on.
    fn transmit(&mut self, data: &[u8]) -> Result<(), TxError>;

    /// Queue a string reply
    fn transmit_str(&mut self, text: &str) -> Result<(), TxError> {
        self.transmit(text.as_bytes())
    }
}
