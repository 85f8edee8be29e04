//! Sample reporter
//!
//! Fusion outputs arrive whenever the algorithm produces them. Each one is
//! rendered right away in the configured format and replaces the previous
//! one. The tick counts seconds; once a full reporting period has elapsed
//! and the last fusion status was ok, the latest sample is sent, again if
//! no newer output arrived in the meantime.

use core::fmt::Write;

use envnode_hal::{OutputPin, ReplySink, TxError};
use envnode_protocol::OutputFormat;
use heapless::String;

use crate::config::DeviceConfig;

/// Capacity of one rendered sample
pub const SAMPLE_CAPACITY: usize = 256;

/// Fusion algorithm status code (0 = ok, > 0 warning, < 0 error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusionStatus(pub i16);

impl FusionStatus {
    /// Output is valid
    pub const OK: Self = Self(0);

    /// Neither a warning nor an error
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

/// One output of the fusion algorithm
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusionOutput {
    /// Compensated temperature (°C)
    pub temperature: f32,
    /// Pressure (Pa)
    pub pressure: f32,
    /// Compensated relative humidity (%)
    pub humidity: f32,
    /// Gas sensor resistance (Ω)
    pub gas_resistance: f32,
    /// Indoor air quality index
    pub iaq: f32,
    /// IAQ accuracy, 0 (uninitialized) to 3
    pub iaq_accuracy: u8,
    /// CO2 equivalent (ppm)
    pub co2_equivalent: f32,
    /// Breath VOC equivalent (ppm)
    pub breath_voc_equivalent: f32,
    /// Algorithm status for this output
    pub status: FusionStatus,
}

/// What to do with the accuracy indicator this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Blink: accuracy still at its lowest level
    Toggle,
    /// Hold off
    Off,
}

impl Indicator {
    /// Apply to a pin
    pub fn drive<P: OutputPin>(self, pin: &mut P) {
        match self {
            Indicator::Toggle => pin.toggle(),
            Indicator::Off => pin.set_off(),
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutcome {
    pub indicator: Indicator,
    /// A sample was flushed (or attempted) this tick
    pub flushed: bool,
    pub tx_error: Option<TxError>,
}

/// Periodic sample formatter
#[derive(Debug)]
pub struct Reporter {
    pending: String<SAMPLE_CAPACITY>,
    accuracy: u8,
    status: FusionStatus,
    count: u32,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Create a reporter with no sample and the counter at zero
    pub const fn new() -> Self {
        Self {
            pending: String::new(),
            accuracy: 0,
            status: FusionStatus::OK,
            count: 0,
        }
    }

    /// Record a fusion output and render it in the configured format
    ///
    /// Returns `false` if the rendering did not fit and was dropped.
    pub fn on_fusion_output(&mut self, output: &FusionOutput, format: OutputFormat) -> bool {
        self.accuracy = output.iaq_accuracy;
        self.status = output.status;

        self.pending.clear();
        if render(&mut self.pending, output, format).is_err() {
            self.pending.clear();
            return false;
        }
        true
    }

    /// Advance one second
    pub fn on_tick<S: ReplySink>(&mut self, config: &DeviceConfig, sink: &mut S) -> TickOutcome {
        let indicator = if self.accuracy == 0 && config.led_enabled {
            Indicator::Toggle
        } else {
            Indicator::Off
        };

        let mut outcome = TickOutcome {
            indicator,
            flushed: false,
            tx_error: None,
        };

        self.count = self.count.saturating_add(1);
        if self.count >= config.period.seconds() && self.status.is_ok() {
            self.count = 0;
            if !self.pending.is_empty() {
                outcome.flushed = true;
                outcome.tx_error = sink.transmit_str(&self.pending).err();
            }
        }

        outcome
    }

    /// Rendered sample waiting for the next flush
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

/// Render `output`; pressure goes out in hPa
fn render<const N: usize>(
    out: &mut String<N>,
    o: &FusionOutput,
    format: OutputFormat,
) -> core::fmt::Result {
    let hpa = o.pressure / 100.0;
    match format {
        OutputFormat::Json => write!(
            out,
            "{{\"temperature\": {:.2}, \"pressure\": {:.2}, \"humidity\": {:.2}, \"gasResistance\": {:6.0}, \
\"IAQ\": {:.1}, \"iaqAccuracy\": {}, \"eqCO2\": {:.2}, \"eqBreathVOC\": {:.2}}}\r\n",
            o.temperature, hpa, o.humidity, o.gas_resistance, o.iaq, o.iaq_accuracy,
            o.co2_equivalent, o.breath_voc_equivalent
        ),
        OutputFormat::Csv => write!(
            out,
            "{:.2}, {:.2}, {:.2}, {:6.0}, {:.1}, {}, {:.1}, {:.2},\r\n",
            o.temperature, hpa, o.humidity, o.gas_resistance, o.iaq, o.iaq_accuracy,
            o.co2_equivalent, o.breath_voc_equivalent
        ),
        OutputFormat::Human => write!(
            out,
            "Temperature: {:.2} C, Pressure: {:.2} hPa, Humidity: {:.2} %rH, Gas resistance: {:6.0} ohms, \
IAQ: {:.1}, IAQ Accuracy: {}, CO2equivalent: {:.1}, Breath VOC equivalent: {:.2}\r\n",
            o.temperature, hpa, o.humidity, o.gas_resistance, o.iaq, o.iaq_accuracy,
            o.co2_equivalent, o.breath_voc_equivalent
        ),
        OutputFormat::Binary => Ok(()),
    }
}
