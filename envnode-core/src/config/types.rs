//! Configuration type definitions
//!
//! These types represent the device-visible settings. Every field that has a
//! range is a validated newtype, so a [`DeviceConfig`] can never hold an
//! out-of-range value.

use core::fmt::{self, Write};

use envnode_protocol::OutputFormat;
use heapless::String;

/// Reporting periods selectable by the single-character commands, in seconds
pub const PERIOD_TABLE: [u16; 7] = [3, 10, 30, 60, 600, 1800, 3600];

/// Labels for [`PERIOD_TABLE`]
const PERIOD_LABELS: [&str; 7] = [
    "3 sec", "10 sec", "30 sec", "1 min", "10 min", "30 min", "1 hour",
];

/// Shortest reporting period accepted from JSON (seconds)
pub const MIN_PERIOD_SECS: i64 = 1;

/// Longest reporting period accepted from JSON (seconds)
pub const MAX_PERIOD_SECS: i64 = 3600;

/// Temperature offset bounds (°C, inclusive)
pub const MIN_TEMPERATURE_OFFSET: f32 = -15.0;
pub const MAX_TEMPERATURE_OFFSET: f32 = 15.0;

/// Self-heating compensation applied when nothing is configured (°C)
pub const DEFAULT_TEMPERATURE_OFFSET: f32 = 6.0;

/// Length of the derived serial number
pub const SERIAL_LEN: usize = 12;

/// A value refused by the configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejected {
    /// Period table index outside 0..=6
    PeriodIndex(u8),
    /// Period outside 1..=3600 seconds
    PeriodOutOfRange,
    /// Temperature offset outside -15..=15 or not a number
    OffsetOutOfRange,
}

/// Reporting period
///
/// Stored as seconds only; the table index is derived, so the two can never
/// disagree. Periods set over JSON that are not table entries have no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportingPeriod {
    seconds: u16,
}

impl Default for ReportingPeriod {
    fn default() -> Self {
        Self {
            seconds: PERIOD_TABLE[0],
        }
    }
}

impl ReportingPeriod {
    /// Select a table entry (0 = 3 s ... 6 = 1 h)
    pub fn from_index(index: u8) -> Result<Self, Rejected> {
        PERIOD_TABLE
            .get(index as usize)
            .map(|&seconds| Self { seconds })
            .ok_or(Rejected::PeriodIndex(index))
    }

    /// Any period within 1..=3600 seconds
    pub fn from_seconds(seconds: i64) -> Result<Self, Rejected> {
        if !(MIN_PERIOD_SECS..=MAX_PERIOD_SECS).contains(&seconds) {
            return Err(Rejected::PeriodOutOfRange);
        }
        Ok(Self {
            seconds: seconds as u16,
        })
    }

    /// Period in seconds
    pub fn seconds(self) -> u32 {
        self.seconds as u32
    }

    /// Table index, if this period is a table entry
    pub fn index(self) -> Option<u8> {
        PERIOD_TABLE
            .iter()
            .position(|&s| s == self.seconds)
            .map(|i| i as u8)
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(i) => f.write_str(PERIOD_LABELS[i as usize]),
            None => write!(f, "{} sec", self.seconds),
        }
    }
}

/// Temperature compensation offset in °C, within [-15, 15]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureOffset(f32);

impl Default for TemperatureOffset {
    fn default() -> Self {
        Self(DEFAULT_TEMPERATURE_OFFSET)
    }
}

impl TemperatureOffset {
    /// Validate an offset. NaN is rejected.
    pub fn new(degrees: f32) -> Result<Self, Rejected> {
        if (MIN_TEMPERATURE_OFFSET..=MAX_TEMPERATURE_OFFSET).contains(&degrees) {
            Ok(Self(degrees))
        } else {
            Err(Rejected::OffsetOutOfRange)
        }
    }

    /// Offset in °C
    pub fn degrees(self) -> f32 {
        self.0
    }
}

/// Device serial number, derived once from the MCU unique ID
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialNumber(String<SERIAL_LEN>);

impl SerialNumber {
    /// Derive from the 96-bit unique ID (three little-endian words)
    ///
    /// Eight hex digits of `uid0 + uid2` followed by four hex digits of the
    /// upper half of `uid1`.
    pub fn from_uid(uid: &[u8; 12]) -> Self {
        let word = |i: usize| u32::from_le_bytes([uid[i], uid[i + 1], uid[i + 2], uid[i + 3]]);
        let (uid0, uid1, uid2) = (word(0), word(4), word(8));

        let mut text = String::new();
        // 12 hex digits always fit
        let _ = write!(text, "{:08X}{:04X}", uid0.wrapping_add(uid2), uid1 >> 16);
        Self(text)
    }

    /// Restore a persisted serial, refusing anything that is not 12 hex digits
    pub fn from_persisted(text: &str) -> Option<Self> {
        if text.len() != SERIAL_LEN || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        String::try_from(text).ok().map(Self)
    }

    /// Serial as text (empty until derived)
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check if the serial has not been derived yet
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sensor channels fed to the fusion algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorChannels {
    pub gas: bool,
    pub temperature: bool,
    pub humidity: bool,
    pub pressure: bool,
}

impl Default for SensorChannels {
    fn default() -> Self {
        Self {
            gas: true,
            temperature: true,
            humidity: true,
            pressure: true,
        }
    }
}

/// Settings handed to the fusion collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusionSettings {
    pub temperature_offset: f32,
    pub channels: SensorChannels,
}

/// Device configuration record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Interval between emitted samples
    pub period: ReportingPeriod,
    /// Sensor channels enabled
    pub channels: SensorChannels,
    /// Accuracy indicator LED enabled
    pub led_enabled: bool,
    /// Sample output format
    pub format: OutputFormat,
    /// Temperature compensation
    pub temperature_offset: TemperatureOffset,
    serial: SerialNumber,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceConfig {
    /// Compile-time defaults: 3 s, all channels, LED on, JSON, +6.0 °C
    pub fn new() -> Self {
        Self {
            period: ReportingPeriod::default(),
            channels: SensorChannels::default(),
            led_enabled: true,
            format: OutputFormat::Json,
            temperature_offset: TemperatureOffset::default(),
            serial: SerialNumber::default(),
        }
    }

    /// Serial number
    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }

    /// Derive the serial number unless one is already set
    ///
    /// Returns `true` if the serial was derived by this call.
    pub fn ensure_serial(&mut self, uid: &[u8; 12]) -> bool {
        if !self.serial.is_unset() {
            return false;
        }
        self.serial = SerialNumber::from_uid(uid);
        true
    }

    pub(crate) fn restore_serial(&mut self, serial: SerialNumber) {
        self.serial = serial;
    }

    /// Select a period from the table
    pub fn set_period_index(&mut self, index: u8) -> Result<ReportingPeriod, Rejected> {
        self.period = ReportingPeriod::from_index(index)?;
        Ok(self.period)
    }

    /// Set the period in seconds; the record is unchanged on rejection
    pub fn set_period_seconds(&mut self, seconds: i64) -> Result<ReportingPeriod, Rejected> {
        self.period = ReportingPeriod::from_seconds(seconds)?;
        Ok(self.period)
    }

    /// Set the temperature offset; the record is unchanged on rejection
    pub fn set_temperature_offset(&mut self, degrees: f32) -> Result<(), Rejected> {
        self.temperature_offset = TemperatureOffset::new(degrees)?;
        Ok(())
    }

    /// Settings for the fusion collaborator
    pub fn fusion_settings(&self) -> FusionSettings {
        FusionSettings {
            temperature_offset: self.temperature_offset.degrees(),
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::new();
        assert_eq!(config.period.seconds(), 3);
        assert_eq!(config.period.index(), Some(0));
        assert!(config.led_enabled);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.temperature_offset.degrees(), 6.0);
        assert!(config.channels.gas && config.channels.pressure);
        assert!(config.serial().is_unset());
    }

    #[test]
    fn test_period_index_four_is_one_minute() {
        let mut config = DeviceConfig::new();
        let period = config.set_period_index(3).unwrap();
        assert_eq!(period.seconds(), 60);
        assert_eq!(config.period.index(), Some(3));
    }

    #[test]
    fn test_period_index_out_of_table() {
        let mut config = DeviceConfig::new();
        assert_eq!(config.set_period_index(7), Err(Rejected::PeriodIndex(7)));
        assert_eq!(config.period.seconds(), 3);
    }

    #[test]
    fn test_period_seconds_bounds() {
        let mut config = DeviceConfig::new();
        assert!(config.set_period_seconds(1).is_ok());
        assert!(config.set_period_seconds(3600).is_ok());
        assert_eq!(config.set_period_seconds(0), Err(Rejected::PeriodOutOfRange));
        assert_eq!(config.set_period_seconds(3601), Err(Rejected::PeriodOutOfRange));
        assert_eq!(config.period.seconds(), 3600);
    }

    #[test]
    fn test_table_period_from_seconds_has_index() {
        let period = ReportingPeriod::from_seconds(30).unwrap();
        assert_eq!(period.index(), Some(2));

        let custom = ReportingPeriod::from_seconds(45).unwrap();
        assert_eq!(custom.index(), None);
        assert_eq!(custom.seconds(), 45);
    }

    #[test]
    fn test_period_labels() {
        let label = |p: ReportingPeriod| {
            let mut s: String<16> = String::new();
            write!(s, "{}", p).unwrap();
            s
        };
        assert_eq!(label(ReportingPeriod::from_index(3).unwrap()), "1 min");
        assert_eq!(label(ReportingPeriod::from_index(6).unwrap()), "1 hour");
        assert_eq!(label(ReportingPeriod::from_seconds(45).unwrap()), "45 sec");
    }

    #[test]
    fn test_temperature_offset_bounds() {
        let mut config = DeviceConfig::new();
        assert_eq!(config.set_temperature_offset(20.0), Err(Rejected::OffsetOutOfRange));
        assert_eq!(config.temperature_offset.degrees(), 6.0);

        assert!(config.set_temperature_offset(-15.0).is_ok());
        assert_eq!(config.temperature_offset.degrees(), -15.0);
        assert!(config.set_temperature_offset(15.0).is_ok());
        assert_eq!(config.temperature_offset.degrees(), 15.0);

        assert_eq!(config.set_temperature_offset(f32::NAN), Err(Rejected::OffsetOutOfRange));
    }

    #[test]
    fn test_serial_from_uid() {
        let mut uid = [0u8; 12];
        uid[0..4].copy_from_slice(&0x1000_0001u32.to_le_bytes());
        uid[4..8].copy_from_slice(&0xABCD_1234u32.to_le_bytes());
        uid[8..12].copy_from_slice(&0x0000_00FFu32.to_le_bytes());

        let serial = SerialNumber::from_uid(&uid);
        assert_eq!(serial.as_str(), "10000100ABCD");
    }

    #[test]
    fn test_serial_derived_once() {
        let mut config = DeviceConfig::new();
        assert!(config.ensure_serial(&[0x11; 12]));
        let first = config.serial().clone();

        assert!(!config.ensure_serial(&[0x22; 12]));
        assert_eq!(config.serial(), &first);
    }

    #[test]
    fn test_persisted_serial_validation() {
        assert!(SerialNumber::from_persisted("0123456789AB").is_some());
        assert!(SerialNumber::from_persisted("0123").is_none());
        assert!(SerialNumber::from_persisted("0123456789XY").is_none());
    }
}
