//! Indicator pin abstraction
//!
//! Status and fault LEDs are driven through this trait so the reporting
//! logic can be exercised on the host.

/// Digital output pin driving an indicator
///
/// `set_on`/`set_off` are in terms of the indicator, not the electrical
/// level. Active-low wiring is handled by the implementation.
pub trait OutputPin {
    /// Turn the indicator on
    fn set_on(&mut self);

    /// Turn the indicator off
    fn set_off(&mut self);

    /// Toggle the indicator
    fn toggle(&mut self);

    /// Set the indicator to a specific state
    fn set_state(&mut self, on: bool) {
        if on {
            self.set_on();
        } else {
            self.set_off();
        }
    }

    /// Check if the indicator is currently on
    fn is_on(&self) -> bool;
}
