//! Locating the original message headers inside a bounce
//!
//! Standard reports carry them in a `message/rfc822` (or
//! `text/rfc822-headers`) part, vendor daemons paste them into the plain
//! text body after a blank line. Both produce the same [`HeaderBlock`].

use crate::error::{ParseError, Result};
use crate::types::EmailAddress;
use mailparse::{MailHeader, MailHeaderMap, ParsedMail};
use regex::bytes::Regex;
use tracing::debug;

// One or more blank lines, then a `Token: value` line
static FREE_TEXT_HEADERS_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"(?m)^[\r\n]+^([A-Za-z0-9-]{2,25}:)").unwrap());

/// Where to look for the embedded headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSource {
    /// First sub-part whose media type mentions `rfc822`
    Rfc822Part,

    /// First header-shaped block after a blank line in the body text
    FreeText,
}

impl HeaderSource {
    /// Find and parse the embedded header block of `mail`
    pub fn extract(self, mail: &ParsedMail<'_>) -> Result<HeaderBlock> {
        match self {
            Self::Rfc822Part => from_rfc822_part(mail),
            Self::FreeText => from_free_text(mail),
        }
    }
}

fn from_rfc822_part(mail: &ParsedMail<'_>) -> Result<HeaderBlock> {
    if !mail.ctype.mimetype.starts_with("multipart/") {
        return Err(ParseError::NotMultipart);
    }

    let part = mail
        .subparts
        .iter()
        .find(|part| part.ctype.mimetype.to_lowercase().contains("rfc822"))
        .ok_or(ParseError::EmbeddedHeadersNotFound)?;

    debug!("Reading embedded headers from {} part", part.ctype.mimetype);
    let content = part
        .get_body_raw()
        .map_err(|e| ParseError::DecodeFailure(e.to_string()))?;

    HeaderBlock::parse(&content, HeaderSource::Rfc822Part)
}

fn from_free_text(mail: &ParsedMail<'_>) -> Result<HeaderBlock> {
    let body = mail
        .get_body_raw()
        .map_err(|e| ParseError::DecodeFailure(e.to_string()))?;

    let start = FREE_TEXT_HEADERS_REGEX
        .captures(&body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.start())
        .ok_or(ParseError::EmbeddedHeadersNotFound)?;

    debug!("Reading embedded headers from body text at offset {start}");
    HeaderBlock::parse(&body[start..], HeaderSource::FreeText)
}

/// Headers of the original message found inside a bounce
///
/// Owns the raw header bytes; lookups are case-insensitive and keep the
/// original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    raw: Vec<u8>,
    source: HeaderSource,
}

impl HeaderBlock {
    /// Parse the header section at the start of `raw`; anything after the
    /// first blank line is dropped.
    pub fn parse(raw: &[u8], source: HeaderSource) -> Result<Self> {
        let (_, end) =
            mailparse::parse_headers(raw).map_err(|e| ParseError::Structure(e.to_string()))?;

        Ok(Self {
            raw: raw[..end].to_vec(),
            source,
        })
    }

    #[must_use]
    pub const fn source(&self) -> HeaderSource {
        self.source
    }

    /// Raw header section bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn headers(&self) -> Result<Vec<MailHeader<'_>>> {
        mailparse::parse_headers(&self.raw)
            .map(|(headers, _)| headers)
            .map_err(|e| ParseError::Structure(e.to_string()))
    }

    /// First value of `name`, unfolded and decoded
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.headers().ok()?.get_first_value(name)
    }

    /// Every value of `name` in order
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.headers()
            .map(|headers| headers.get_all_values(name))
            .unwrap_or_default()
    }

    /// Number of header fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers().map_or(0, |headers| headers.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse `name` as a single mailbox
    pub fn address(&self, name: &str) -> Result<EmailAddress> {
        let headers = self.headers()?;
        address_from(&headers, name)
    }
}

/// Parse the first `name` header of `headers` as a single mailbox
pub(crate) fn address_from(headers: &[MailHeader<'_>], name: &str) -> Result<EmailAddress> {
    let header = headers
        .get_first_header(name)
        .ok_or_else(|| ParseError::UnparseableAddress {
            header: name.to_string(),
            details: "header missing".into(),
        })?;

    EmailAddress::from_header(header).ok_or_else(|| ParseError::UnparseableAddress {
        header: name.to_string(),
        details: format!("Could not parse: {}", header.get_value()),
    })
}
