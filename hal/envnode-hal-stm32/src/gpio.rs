//! Indicator LEDs for STM32L4
//!
//! LEDs are push-pull outputs. Polarity depends on the board wiring.

use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::Peri;

use envnode_hal::OutputPin;

/// LED on a push-pull output
pub struct Led<'d> {
    pin: Output<'d>,
    active_low: bool,
}

impl<'d> Led<'d> {
    /// Configure an active-low LED, initially off
    pub fn active_low(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            pin: Output::new(pin, Level::High, Speed::Low),
            active_low: true,
        }
    }

    /// Configure an active-high LED, initially off
    pub fn active_high(pin: Peri<'d, impl Pin>) -> Self {
        Self {
            pin: Output::new(pin, Level::Low, Speed::Low),
            active_low: false,
        }
    }
}

impl<'d> OutputPin for Led<'d> {
    fn set_on(&mut self) {
        if self.active_low {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn set_off(&mut self) {
        if self.active_low {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }

    fn is_on(&self) -> bool {
        self.pin.is_set_high() != self.active_low
    }
}
