//! envnode - Environmental Sensor Node Firmware
//!
//! Main firmware binary for STM32L432KC-based sensor nodes. Reports
//! gas/temperature/humidity/pressure samples over the serial link and
//! accepts runtime configuration through a small command shell.
//!
//! Boot sequence:
//! 1. Start the watchdog, load the configuration record (or defaults)
//! 2. Derive the serial number from the MCU unique ID
//! 3. Restore the fusion state for the fusion collaborator
//! 4. Spawn the serial, tick and controller tasks

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::peripherals::USART2;
use embassy_stm32::usart::{BufferedInterruptHandler, BufferedUart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use envnode_core::fusion::{StateBlob, MAX_STATE_LEN};
use envnode_core::shell::Identity;
use envnode_core::storage::{BlockStore, Persistence, SaveInterval};
use envnode_core::{DeviceConfig, Node};
use envnode_hal_stm32::uart::serial_config;
use envnode_hal_stm32::{Iwdg, Led, Stm32Pages};

use crate::channels::FUSION_BOOT_STATE;

mod channels;
mod fault;
// TODO: spawn `fusion::run` once the BME680/BSEC engine is linked in
#[allow(dead_code)]
mod fusion;
mod tasks;

bind_interrupts!(struct Irqs {
    USART2 => BufferedInterruptHandler<USART2>;
});

/// Persistence over the reserved flash pages
pub type Storage = Persistence<Stm32Pages<'static>, Iwdg<'static>>;

/// Identity reported by the `info` command
const IDENTITY: Identity = Identity {
    device: "STM32L432KC",
    firmware: env!("CARGO_PKG_VERSION"),
};

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("envnode firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    // Indicators: LD3 on the board, fault LED on PA8
    let status_led = Led::active_high(p.PB3);
    let mut fault_led = Led::active_high(p.PA8);

    let watchdog = Iwdg::start(p.IWDG);
    let mut storage: Storage =
        Persistence::new(BlockStore::new(Stm32Pages::new(p.FLASH), watchdog));

    let mut config = load_config(&mut storage, &mut fault_led);
    if config.ensure_serial(embassy_stm32::uid::uid()) {
        info!("Serial number: {}", config.serial().as_str());
    }

    restore_fusion_state(&mut storage, &mut fault_led);

    // Serial link (ST-LINK virtual COM port)
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = match BufferedUart::new(
        p.USART2,
        p.PA15,
        p.PA2,
        tx_buf,
        rx_buf,
        Irqs,
        serial_config(),
    ) {
        Ok(uart) => uart,
        Err(e) => defmt::panic!("UART configuration rejected: {:?}", e),
    };
    let (tx, rx) = uart.split();

    let node = Node::new(config, IDENTITY, SaveInterval::default());

    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner
        .spawn(tasks::controller_task(node, storage, status_led, fault_led))
        .unwrap();

    info!("All tasks spawned");
}

/// Load the persisted configuration, falling back to defaults
fn load_config(storage: &mut Storage, fault_led: &mut Led<'static>) -> DeviceConfig {
    match storage.load_config() {
        Ok(Some(config)) => {
            info!("Configuration loaded from flash");
            config
        }
        Ok(None) => {
            info!("No stored configuration, using defaults");
            DeviceConfig::new()
        }
        Err(e) if e.is_fatal() => fault::halt(fault_led, e),
        Err(e) => {
            warn!("Configuration load failed: {:?}, using defaults", e);
            DeviceConfig::new()
        }
    }
}

/// Hand the saved fusion state to the fusion collaborator
fn restore_fusion_state(storage: &mut Storage, fault_led: &mut Led<'static>) {
    let mut buf = [0u8; MAX_STATE_LEN];
    match storage.load_fusion_state(&mut buf) {
        Ok(0) => info!("No stored fusion state"),
        Ok(len) => {
            info!("Fusion state loaded ({} bytes)", len);
            if let Ok(state) = StateBlob::from_slice(&buf[..len]) {
                FUSION_BOOT_STATE.signal(state);
            }
        }
        Err(e) if e.is_fatal() => fault::halt(fault_led, e),
        Err(e) => warn!("Fusion state load failed: {:?}", e),
    }
}
