// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Bounce Report Extraction
//!
//! Classifies bounce and abuse notification messages and recovers the
//! delivery-failure facts they carry: who bounced, for whom, why, when, and
//! the identity of the original message.
//!
//! # Supported dialects
//!
//! - Delivery status notifications (`multipart/report; report-type=delivery-status`)
//! - Feedback loop reports (`multipart/report; report-type=feedback-report`)
//! - Vendor mailer daemons (`X-Mailer-Daemon-Error` / `X-Mailer-Daemon-Recipients`)
//!
//! # Example
//!
//! ```rust
//! use bounce_extract::parse_report;
//!
//! let raw = b"From: someone@example.com\r\nSubject: Hello\r\n\r\nBody";
//! assert!(parse_report(raw).unwrap().is_none());
//! ```

mod classify;
mod date;
mod embedded;
mod error;
mod parser;
mod pipeline;
mod types;

pub use classify::{DAEMON_ERROR_HEADER, DAEMON_RECIPIENTS_HEADER, classify};
pub use date::{parse_date, zone_offset};
pub use embedded::{HeaderBlock, HeaderSource};
pub use error::{ParseError, Result};
pub use parser::{POSTMASTER_MSGTYPE_HEADER, build_report, parse_report};
pub use pipeline::{
    CollectStats, Collector, CollectorConfig, DEFAULT_QUEUE_CAPACITY, RawMessage,
};
pub use types::*;
