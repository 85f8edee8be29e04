//! Serial Command Shell Protocol
//!
//! This crate defines the line-oriented shell spoken over the node's serial
//! link. Inbound bytes are assembled into lines, and each line is one of:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ single char  │ J M C (format)  E D (LED)  S (status)  1..7  │
//! │ JSON object  │ {"led":true,"format":"c","reportingPeriod":30} │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Lines are terminated by CR or LF. Anything else gets the help text.
//! This crate only decodes; the configuration record and the replies live in
//! `envnode-core`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod json;
pub mod line;

pub use command::{CharCommand, Input, OutputFormat, Request, Requests};
pub use json::{JsonError, Member, Object, Value};
pub use line::{Feed, LineAssembler, ShellLine, LINE_CAPACITY};
