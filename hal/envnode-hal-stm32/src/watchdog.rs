//! Independent watchdog (IWDG)

use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_stm32::Peri;

use envnode_hal::Watchdog;

/// Watchdog timeout (~10 s)
pub const WATCHDOG_TIMEOUT_US: u32 = 10_000_000;

/// IWDG wrapper implementing the [`Watchdog`] trait
pub struct Iwdg<'d> {
    wdg: IndependentWatchdog<'d, IWDG>,
}

impl<'d> Iwdg<'d> {
    /// Configure and start the watchdog
    ///
    /// Once started the IWDG cannot be stopped.
    pub fn start(iwdg: Peri<'d, IWDG>) -> Self {
        let mut wdg = IndependentWatchdog::new(iwdg, WATCHDOG_TIMEOUT_US);
        wdg.unleash();
        Self { wdg }
    }
}

impl<'d> Watchdog for Iwdg<'d> {
    fn feed(&mut self) {
        self.wdg.pet();
    }
}
