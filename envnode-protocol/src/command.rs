//! Shell command decoding
//!
//! A completed line is classified into one of two sub-protocols:
//!
//! - exactly one character: a single-character command ([`CharCommand`])
//! - starts with `{`: a JSON object whose top-level keys are decoded into
//!   [`Request`]s one at a time
//!
//! Decoding never mutates anything; applying the commands is up to the caller.

use crate::json::{JsonError, Member, Members, Object, Value};

/// Sample output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputFormat {
    #[default]
    Json = 0,
    Human = 1,
    Csv = 2,
    /// Placeholder, renders nothing
    Binary = 3,
}

impl OutputFormat {
    /// Upper-case name used in status replies
    pub const fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "JSON",
            OutputFormat::Human => "HUMAN",
            OutputFormat::Csv => "CSV",
            OutputFormat::Binary => "BINARY",
        }
    }

    /// Decode from the first letter of a JSON `format` value (case-insensitive)
    pub fn from_initial(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'c' => Some(OutputFormat::Csv),
            'j' => Some(OutputFormat::Json),
            'h' => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert from the persisted discriminant
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OutputFormat::Json),
            1 => Some(OutputFormat::Human),
            2 => Some(OutputFormat::Csv),
            3 => Some(OutputFormat::Binary),
            _ => None,
        }
    }
}

/// Single-character command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharCommand {
    /// `J`, `M`, `C`
    Format(OutputFormat),
    /// `E` enables, `D` disables the status LED
    Led(bool),
    /// `S`
    Status,
    /// `1`..`7`, carried as the period table index 0..6
    Period(u8),
    /// Anything else
    Help,
}

impl CharCommand {
    /// Decode one byte. Every byte maps to a command.
    pub fn decode(byte: u8) -> Self {
        match byte.to_ascii_uppercase() {
            b'J' => CharCommand::Format(OutputFormat::Json),
            b'M' => CharCommand::Format(OutputFormat::Human),
            b'C' => CharCommand::Format(OutputFormat::Csv),
            b'E' => CharCommand::Led(true),
            b'D' => CharCommand::Led(false),
            b'S' => CharCommand::Status,
            d @ b'1'..=b'7' => CharCommand::Period(d - b'1'),
            _ => CharCommand::Help,
        }
    }
}

/// Classified shell line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Nothing but whitespace
    Empty,
    /// One payload character
    Char(CharCommand),
    /// JSON object text (not yet validated)
    Json(&'a [u8]),
    /// Neither sub-protocol
    Unknown,
}

impl<'a> Input<'a> {
    /// Classify a completed line
    pub fn classify(line: &'a [u8]) -> Self {
        let line = line.trim_ascii();
        match line {
            [] => Input::Empty,
            [byte] => Input::Char(CharCommand::decode(*byte)),
            [b'{', ..] => Input::Json(line),
            _ => Input::Unknown,
        }
    }
}

/// One decoded top-level JSON key
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// `status`: reply with the current state, stop scanning
    Status,
    /// `info`: reply with the device identity, stop scanning
    Info,
    /// `led`
    Led(bool),
    /// `format`
    Format(OutputFormat),
    /// `reportingPeriod` in seconds, range not yet checked
    ReportingPeriod(i64),
    /// `temperatureOffset` in degrees, range not yet checked
    TemperatureOffset(f32),
    /// `saveConfig`
    SaveConfig,
    /// Key not recognized
    Unrecognized(&'a str),
    /// Recognized key with a value that could not be decoded
    Invalid(&'a str),
}

impl<'a> Request<'a> {
    /// Decode one object member
    pub fn from_member(member: Member<'a>) -> Self {
        let Member { key, value } = member;
        let decoded = match key {
            "status" => Some(Request::Status),
            "info" => Some(Request::Info),
            "saveConfig" => Some(Request::SaveConfig),
            "led" => match value.initial() {
                Some('t') => Some(Request::Led(true)),
                Some('f') => Some(Request::Led(false)),
                _ => None,
            },
            "format" => value
                .initial()
                .and_then(OutputFormat::from_initial)
                .map(Request::Format),
            "reportingPeriod" => number(value)
                .and_then(|text| text.parse::<i64>().ok())
                .map(Request::ReportingPeriod),
            "temperatureOffset" => number(value)
                .and_then(|text| text.parse::<f32>().ok())
                .map(Request::TemperatureOffset),
            _ => return Request::Unrecognized(key),
        };

        decoded.unwrap_or(Request::Invalid(key))
    }
}

/// Numeric text of a number or a string holding one
fn number<'a>(value: Value<'a>) -> Option<&'a str> {
    match value {
        Value::Number(text) | Value::String(text) => Some(text.trim()),
        _ => None,
    }
}

/// Requests decoded from a JSON command line, in document order
pub struct Requests<'a> {
    members: Members<'a>,
}

impl<'a> Requests<'a> {
    /// Validate the line and prepare to decode its keys
    pub fn parse(line: &'a [u8]) -> Result<Self, JsonError> {
        let object = Object::parse(line)?;
        Ok(Self {
            members: object.members(),
        })
    }
}

impl<'a> Iterator for Requests<'a> {
    type Item = Request<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.members.next().map(Request::from_member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_commands_case_insensitive() {
        assert_eq!(CharCommand::decode(b'j'), CharCommand::Format(OutputFormat::Json));
        assert_eq!(CharCommand::decode(b'M'), CharCommand::Format(OutputFormat::Human));
        assert_eq!(CharCommand::decode(b'c'), CharCommand::Format(OutputFormat::Csv));
        assert_eq!(CharCommand::decode(b'e'), CharCommand::Led(true));
        assert_eq!(CharCommand::decode(b'D'), CharCommand::Led(false));
        assert_eq!(CharCommand::decode(b's'), CharCommand::Status);
    }

    #[test]
    fn test_period_selectors() {
        assert_eq!(CharCommand::decode(b'1'), CharCommand::Period(0));
        assert_eq!(CharCommand::decode(b'4'), CharCommand::Period(3));
        assert_eq!(CharCommand::decode(b'7'), CharCommand::Period(6));
        assert_eq!(CharCommand::decode(b'0'), CharCommand::Help);
        assert_eq!(CharCommand::decode(b'8'), CharCommand::Help);
    }

    #[test]
    fn test_every_byte_has_a_command() {
        let help = (0..=255u8)
            .filter(|&b| CharCommand::decode(b) == CharCommand::Help)
            .count();
        // 6 letters in both cases plus 7 digits
        assert_eq!(help, 256 - 19);
    }

    #[test]
    fn test_classify() {
        assert_eq!(Input::classify(b""), Input::Empty);
        assert_eq!(Input::classify(b"  "), Input::Empty);
        assert_eq!(Input::classify(b"s"), Input::Char(CharCommand::Status));
        assert_eq!(Input::classify(b" 4 "), Input::Char(CharCommand::Period(3)));
        assert_eq!(Input::classify(b"{\"info\":1}"), Input::Json(b"{\"info\":1}"));
        assert_eq!(Input::classify(b"hello"), Input::Unknown);
    }

    #[test]
    fn test_format_initials() {
        assert_eq!(OutputFormat::from_initial('C'), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_initial('h'), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::from_initial('J'), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_initial('b'), None);
    }

    #[test]
    fn test_multi_key_requests() {
        let reqs: heapless::Vec<Request, 8> =
            Requests::parse(br#"{"led":true,"format":"c","reportingPeriod":30}"#)
                .unwrap()
                .collect();
        assert_eq!(
            reqs.as_slice(),
            &[
                Request::Led(true),
                Request::Format(OutputFormat::Csv),
                Request::ReportingPeriod(30),
            ]
        );
    }

    #[test]
    fn test_value_decoding() {
        let reqs: heapless::Vec<Request, 8> = Requests::parse(
            br#"{"led":"false","format":"Human","temperatureOffset":-2.5,"saveConfig":null,"colour":"red"}"#,
        )
        .unwrap()
        .collect();
        assert_eq!(
            reqs.as_slice(),
            &[
                Request::Led(false),
                Request::Format(OutputFormat::Human),
                Request::TemperatureOffset(-2.5),
                Request::SaveConfig,
                Request::Unrecognized("colour"),
            ]
        );
    }

    #[test]
    fn test_undecodable_values() {
        let reqs: heapless::Vec<Request, 8> =
            Requests::parse(br#"{"led":1,"format":"x","reportingPeriod":2.5}"#)
                .unwrap()
                .collect();
        assert_eq!(
            reqs.as_slice(),
            &[
                Request::Invalid("led"),
                Request::Invalid("format"),
                Request::Invalid("reportingPeriod"),
            ]
        );
    }

    #[test]
    fn test_malformed_rejected() {
        assert_eq!(Requests::parse(br#"{"led":"#).err(), Some(JsonError::UnexpectedEnd));
    }
}
