//! Configuration record serialization
//!
//! The record is stored as postcard binary data inside a codec block on
//! [`Page::Config`]. A leading version byte guards against layout changes;
//! a mismatch reads as "no record" and the caller keeps its defaults.

use envnode_hal::{NorPages, Page, Watchdog};
use envnode_protocol::OutputFormat;
use heapless::String;
use serde::{Deserialize, Serialize};

use super::codec::{PersistError, Persistence};
use crate::config::{
    DeviceConfig, ReportingPeriod, SensorChannels, SerialNumber, TemperatureOffset, SERIAL_LEN,
};

/// Layout version of the persisted record
pub const CONFIG_VERSION: u8 = 1;

/// Buffer size for the encoded record (must exceed the encoded length)
pub const CONFIG_RECORD_CAPACITY: usize = 64;

/// Persisted form of [`DeviceConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ConfigRecord {
    version: u8,
    period_secs: u16,
    gas: bool,
    temperature: bool,
    humidity: bool,
    pressure: bool,
    led_enabled: bool,
    format: u8,
    temperature_offset: f32,
    serial: String<SERIAL_LEN>,
}

impl ConfigRecord {
    fn from_config(config: &DeviceConfig) -> Self {
        Self {
            version: CONFIG_VERSION,
            period_secs: config.period.seconds() as u16,
            gas: config.channels.gas,
            temperature: config.channels.temperature,
            humidity: config.channels.humidity,
            pressure: config.channels.pressure,
            led_enabled: config.led_enabled,
            format: config.format as u8,
            temperature_offset: config.temperature_offset.degrees(),
            serial: String::try_from(config.serial().as_str()).unwrap_or_default(),
        }
    }

    /// Rebuild a config, refusing any field outside its range
    fn into_config(self) -> Option<DeviceConfig> {
        if self.version != CONFIG_VERSION {
            return None;
        }

        let mut config = DeviceConfig::new();
        config.period = ReportingPeriod::from_seconds(self.period_secs as i64).ok()?;
        config.channels = SensorChannels {
            gas: self.gas,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
        };
        config.led_enabled = self.led_enabled;
        config.format = OutputFormat::from_u8(self.format)?;
        config.temperature_offset = TemperatureOffset::new(self.temperature_offset).ok()?;
        if !self.serial.is_empty() {
            config.restore_serial(SerialNumber::from_persisted(&self.serial)?);
        }
        Some(config)
    }
}

/// Serialize `config` into `buf`, returning the encoded bytes
pub fn encode_config<'a>(config: &DeviceConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], PersistError> {
    postcard::to_slice(&ConfigRecord::from_config(config), buf).map_err(|_| PersistError::Encode)
}

/// Deserialize a record; `None` if it is unreadable or from another layout
pub fn decode_config(bytes: &[u8]) -> Option<DeviceConfig> {
    postcard::from_bytes::<ConfigRecord>(bytes)
        .ok()
        .and_then(ConfigRecord::into_config)
}

impl<F: NorPages, W: Watchdog> Persistence<F, W> {
    /// Persist the whole configuration record
    pub fn save_config(&mut self, config: &DeviceConfig) -> Result<(), PersistError> {
        let mut buf = [0u8; CONFIG_RECORD_CAPACITY];
        let bytes = encode_config(config, &mut buf)?;
        self.save(Page::Config, bytes)
    }

    /// Load the configuration record
    ///
    /// `Ok(None)` means no usable record: nothing saved yet, or a record
    /// from an incompatible layout.
    pub fn load_config(&mut self) -> Result<Option<DeviceConfig>, PersistError> {
        let mut buf = [0u8; CONFIG_RECORD_CAPACITY];
        let len = self.load(Page::Config, &mut buf)?;
        if len == 0 {
            return Ok(None);
        }
        Ok(decode_config(&buf[..len]))
    }

    /// Persist the opaque fusion state blob
    pub fn save_fusion_state(&mut self, state: &[u8]) -> Result<(), PersistError> {
        self.save(Page::FusionState, state)
    }

    /// Load the fusion state blob into `buf`, returning its length (0 if absent)
    pub fn load_fusion_state(&mut self, buf: &mut [u8]) -> Result<usize, PersistError> {
        self.load(Page::FusionState, buf)
    }
}
