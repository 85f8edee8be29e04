//! Watchdog abstraction

/// Hardware watchdog that must be refreshed periodically
///
/// Besides the regular refresh from the run loop, the storage layer
/// refreshes it right before every page erase so that a slow erase
/// cannot trip a reset.
pub trait Watchdog {
    /// Reload the watchdog counter
    fn feed(&mut self);
}
