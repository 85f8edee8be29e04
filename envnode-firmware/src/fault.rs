//! Global fault handler
//!
//! Storage faults end normal operation. The fault LED is lit and the core
//! parks without feeding the watchdog, so the watchdog resets the node.

use defmt::*;
use envnode_core::storage::PersistError;
use envnode_hal::OutputPin;

/// Halt after an unrecoverable storage fault
pub fn halt<P: OutputPin>(fault_led: &mut P, error: PersistError) -> ! {
    error!("Storage fault: {:?}, halting", error);
    fault_led.set_on();

    loop {
        cortex_m::asm::wfi();
    }
}
