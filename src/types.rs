//! Core types for bounce reports

use chrono::{DateTime, FixedOffset};
use mailparse::{MailAddrList, MailHeader};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounce dialect a message was classified as
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReportType {
    /// Not a report we know how to read; no record is emitted
    #[default]
    Unknown,

    /// `multipart/report; report-type=delivery-status` (RFC 3464)
    DeliveryStatus,

    /// `multipart/report; report-type=feedback-report` (RFC 5965)
    Feedback,

    /// Vendor mailer daemon with `X-Mailer-Daemon-*` headers
    VendorDaemon,
}

impl ReportType {
    /// Whether a report of this type should be emitted at all
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "Unknown",
            Self::DeliveryStatus => "Delivery Status",
            Self::Feedback => "Feedback Loop",
            Self::VendorDaemon => "X-Mailer",
        };
        f.write_str(label)
    }
}

/// Message ID wrapper type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email address with a possibly empty display name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    /// Display name (e.g., "Mail Delivery Subsystem"), empty when absent
    pub name: String,

    /// Email address (e.g., "mailer-daemon@example.com")
    pub address: String,
}

impl EmailAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Parse a single mailbox such as `"Name" <user@example.com>`
    ///
    /// Lists, groups and values without an `@` are rejected.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        mailparse::addrparse(s.trim()).ok().and_then(Self::from_list)
    }

    /// Parse the address held by a header, decoding encoded-word display names
    #[must_use]
    pub fn from_header(header: &MailHeader<'_>) -> Option<Self> {
        mailparse::addrparse_header(header)
            .ok()
            .and_then(Self::from_list)
    }

    fn from_list(list: MailAddrList) -> Option<Self> {
        let info = list.extract_single_info()?;
        let address = info.addr.trim();
        let (local, domain) = address.split_once('@')?;
        if local.is_empty() || domain.is_empty() {
            return None;
        }

        Some(Self {
            name: info.display_name.unwrap_or_default().trim().to_string(),
            address: address.to_string(),
        })
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.address)
        } else {
            write!(f, "\"{}\" <{}>", self.name, self.address)
        }
    }
}

/// Delivery-failure facts recovered from one bounce message
///
/// Only ever built whole by [`crate::parse_report`]; there is no partially
/// filled report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    /// Identifier assigned by whoever fetched the message
    pub id: String,

    /// When the bounce was generated, with its original offset
    pub date: DateTime<FixedOffset>,

    /// System that generated the bounce
    pub reporter: EmailAddress,

    /// `From` of the original outbound message
    pub sender: EmailAddress,

    /// Address the original message was sent to
    pub recipient: EmailAddress,

    pub report_type: ReportType,

    /// `Message-ID` of the original message, verbatim
    pub message_id: MessageId,

    /// Vendor-specific `X-Postmaster-Msgtype` tag, empty when absent
    pub postmaster_msg_type: String,

    /// Human-readable reason
    pub message: String,
}

impl Report {
    /// Attach the upstream identifier
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    /// Render into the flat record shape used by record sinks
    #[must_use]
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord::from(self)
    }
}

/// Flat, rendered view of a [`Report`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ReportRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub date: String,
    pub reporter: String,
    pub sender: String,
    pub recipient: String,
    pub report_type: String,
    #[serde(rename = "MessageID")]
    pub message_id: String,
    pub postmaster_msg_type: String,
    pub message: String,
}

impl ReportRecord {
    /// Column names in record order
    pub const COLUMNS: [&'static str; 9] = [
        "ID",
        "Date",
        "Reporter",
        "Sender",
        "Recipient",
        "ReportType",
        "MessageID",
        "PostmasterMsgType",
        "Message",
    ];

    /// Field values in the same order as [`Self::COLUMNS`]
    #[must_use]
    pub fn values(&self) -> [&str; 9] {
        [
            self.id.as_str(),
            self.date.as_str(),
            self.reporter.as_str(),
            self.sender.as_str(),
            self.recipient.as_str(),
            self.report_type.as_str(),
            self.message_id.as_str(),
            self.postmaster_msg_type.as_str(),
            self.message.as_str(),
        ]
    }
}

impl From<&Report> for ReportRecord {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            date: report.date.to_rfc3339(),
            reporter: report.reporter.to_string(),
            sender: report.sender.to_string(),
            recipient: report.recipient.to_string(),
            report_type: report.report_type.to_string(),
            message_id: report.message_id.to_string(),
            postmaster_msg_type: report.postmaster_msg_type.clone(),
            message: report.message.clone(),
        }
    }
}
