//! Command shell
//!
//! Applies one completed line to the configuration record and writes the
//! replies. Single-character commands answer with a human-readable
//! confirmation; JSON commands answer with a JSON status or info object.
//!
//! JSON keys are applied in document order. `status` and `info` reply and
//! stop the scan; otherwise a status reply closes the message. A line that
//! fails to parse changes nothing.

use core::fmt::{self, Write};

use envnode_hal::{ReplySink, TxError};
use envnode_protocol::{CharCommand, Input, JsonError, OutputFormat, Request, Requests};
use heapless::{String, Vec};

use crate::config::DeviceConfig;

/// Capacity of one reply, enough for the help text
pub const REPLY_CAPACITY: usize = 512;

/// One reply as queued for the serial link
pub type Reply = Vec<u8, REPLY_CAPACITY>;

const HELP: &str = "\r\n-------------------------------------------------------\r\n\
***  Invalid option.\r\n \
Use:    [m] Human readable, [j] JSON, [c] CSV, [s] Show configuration,\r\n \
LED:    [e] Enable, [d] Disable,\r\n \
Period: [1] 3 sec, [2] 10 sec, [3] 30 sec, [4] 1 min, [5] 10 min, [6] 30 min, [7] 1 hour.\r\n\
-------------------------------------------------------\r\n";

const CSV_COLUMNS: &str = "Format: [temperature], [pressure], [humidity], [gasResistance], \
[IAQ], [accuracy], [eqCO2], [eqBreathVOC]\r\n";

const RULE: &str = "--------------------------------------------------------";

/// Device identity reported by `info`
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    /// Hardware identifier
    pub device: &'static str,
    /// Firmware version, `major.minor.patch`
    pub firmware: &'static str,
}

/// What happened while executing one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outcome {
    /// A configuration field was written
    pub config_changed: bool,
    /// `saveConfig` was requested
    pub save_config: bool,
    /// Values refused (undecodable or out of range)
    pub rejected: u8,
    /// Keys skipped as unknown
    pub unrecognized: u8,
    /// JSON parse failure
    pub parse_error: Option<JsonError>,
    /// First reply that could not be sent
    pub tx_error: Option<TxError>,
    /// A reply was cut short to fit [`REPLY_CAPACITY`]
    pub truncated: bool,
    /// Bytes were dropped while assembling the line
    pub line_overflowed: bool,
}

/// Command interpreter
pub struct Shell {
    identity: Identity,
}

impl Shell {
    /// Create a shell reporting `identity` on `info`
    pub const fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// Execute one completed line
    pub fn execute<S: ReplySink>(
        &self,
        line: &[u8],
        config: &mut DeviceConfig,
        uptime_ms: u64,
        sink: &mut S,
    ) -> Outcome {
        let mut session = Session {
            sink,
            outcome: Outcome::default(),
        };

        match Input::classify(line) {
            Input::Empty => {}
            Input::Char(command) => self.char_command(command, config, uptime_ms, &mut session),
            Input::Json(text) => self.json_command(text, config, uptime_ms, &mut session),
            Input::Unknown => session.send_str(HELP),
        }

        session.outcome
    }

    fn char_command<S: ReplySink>(
        &self,
        command: CharCommand,
        config: &mut DeviceConfig,
        uptime_ms: u64,
        session: &mut Session<'_, S>,
    ) {
        match command {
            CharCommand::Format(format) => {
                config.format = format;
                session.outcome.config_changed = true;
                let name = match format {
                    OutputFormat::Json => "JSON",
                    OutputFormat::Human => "Human Readable",
                    OutputFormat::Csv => "CSV",
                    OutputFormat::Binary => "Binary",
                };
                session.send(format_args!("\r\n*** Config: Set output format to {}.\r\n", name));
                if format == OutputFormat::Csv {
                    session.send_str(CSV_COLUMNS);
                }
            }
            CharCommand::Led(enabled) => {
                config.led_enabled = enabled;
                session.outcome.config_changed = true;
                let state = if enabled { "enabled" } else { "disabled" };
                session.send(format_args!("\r\n*** Config: Status LED {}.\r\n", state));
            }
            CharCommand::Status => {
                session.send(format_args!(
                    "\r\n{}\r\n***  Status:\r\n Sampling period = {}, Format = {}, Uptime = {} ms\r\n{}\r\n",
                    RULE,
                    config.period,
                    config.format.name(),
                    uptime_ms,
                    RULE
                ));
            }
            CharCommand::Period(index) => match config.set_period_index(index) {
                Ok(period) => {
                    session.outcome.config_changed = true;
                    session.send(format_args!("\r\n*** Config: Sampling period set to {}.\r\n", period));
                }
                Err(_) => {
                    session.outcome.rejected += 1;
                    session.send_str(HELP);
                }
            },
            CharCommand::Help => session.send_str(HELP),
        }
    }

    fn json_command<S: ReplySink>(
        &self,
        text: &[u8],
        config: &mut DeviceConfig,
        uptime_ms: u64,
        session: &mut Session<'_, S>,
    ) {
        let requests = match Requests::parse(text) {
            Ok(requests) => requests,
            Err(e) => {
                session.outcome.parse_error = Some(e);
                session.send_str("{\"error\":\"malformed JSON\"}\r\n");
                return;
            }
        };

        for request in requests {
            match request {
                Request::Status => {
                    status_json(config, uptime_ms, session);
                    return;
                }
                Request::Info => {
                    session.send(format_args!(
                        "{{\"device\":\"{}\",\"serial\":\"{}\",\"firmware\":\"{}\"}}\r\n",
                        self.identity.device,
                        config.serial().as_str(),
                        self.identity.firmware
                    ));
                    return;
                }
                Request::Led(enabled) => {
                    config.led_enabled = enabled;
                    session.outcome.config_changed = true;
                }
                Request::Format(format) => {
                    config.format = format;
                    session.outcome.config_changed = true;
                }
                Request::ReportingPeriod(seconds) => match config.set_period_seconds(seconds) {
                    Ok(_) => session.outcome.config_changed = true,
                    Err(_) => session.outcome.rejected += 1,
                },
                Request::TemperatureOffset(degrees) => {
                    match config.set_temperature_offset(degrees) {
                        Ok(()) => session.outcome.config_changed = true,
                        Err(_) => session.outcome.rejected += 1,
                    }
                }
                Request::SaveConfig => session.outcome.save_config = true,
                Request::Unrecognized(_) => session.outcome.unrecognized += 1,
                Request::Invalid(_) => session.outcome.rejected += 1,
            }
        }

        status_json(config, uptime_ms, session);
    }
}

/// JSON status reply
///
/// The `"temperatureOffset:"` key carries a stray colon; clients parse it
/// that way, so it stays.
fn status_json<S: ReplySink>(config: &DeviceConfig, uptime_ms: u64, session: &mut Session<'_, S>) {
    session.send(format_args!(
        "{{\"status\":{{\"reportingPeriod\":{},\"format\":\"{}\",\"temperatureOffset:\":{:.1},\"upTime\":{}}}}}\r\n",
        config.period.seconds(),
        config.format.name(),
        config.temperature_offset.degrees(),
        uptime_ms
    ));
}

/// Reply writer for one line
struct Session<'s, S> {
    sink: &'s mut S,
    outcome: Outcome,
}

impl<S: ReplySink> Session<'_, S> {
    fn send(&mut self, args: fmt::Arguments<'_>) {
        let mut text: String<REPLY_CAPACITY> = String::new();
        if text.write_fmt(args).is_err() {
            self.outcome.truncated = true;
        }
        self.send_str(&text);
    }

    fn send_str(&mut self, text: &str) {
        if let Err(e) = self.sink.transmit_str(text) {
            self.outcome.tx_error.get_or_insert(e);
        }
    }
}
