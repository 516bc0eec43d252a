//! Bounce dialect classification from the outer message headers

use crate::error::{ParseError, Result};
use crate::types::ReportType;
use mailparse::{MailHeader, MailHeaderMap};
use regex::Regex;
use tracing::debug;

/// Header carrying the vendor daemon's error text
pub const DAEMON_ERROR_HEADER: &str = "X-Mailer-Daemon-Error";

/// Header carrying the vendor daemon's failed recipient
pub const DAEMON_RECIPIENTS_HEADER: &str = "X-Mailer-Daemon-Recipients";

static MEDIA_TYPE_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[!#$%&'*+.^_`|~0-9A-Za-z-]+/[!#$%&'*+.^_`|~0-9A-Za-z-]+$").unwrap()
});

/// Returns the dialect it recognises, if any
type Rule = for<'a, 'b> fn(&'a [MailHeader<'b>]) -> Result<Option<ReportType>>;

/// Evaluated top to bottom, the first matching rule decides
const RULES: [Rule; 2] = [vendor_daemon_rule, multipart_report_rule];

/// `report-type` values of `multipart/report` and the dialect each names
const REPORT_TYPES: [(&str, ReportType); 2] = [
    ("feedback-report", ReportType::Feedback),
    ("delivery-status", ReportType::DeliveryStatus),
];

/// Decide which bounce dialect a message uses
///
/// Vendor daemon headers win over `Content-Type`. A missing or empty
/// `Content-Type` is [`ReportType::Unknown`], only a malformed one is an
/// error.
pub fn classify(headers: &[MailHeader<'_>]) -> Result<ReportType> {
    for rule in RULES {
        if let Some(report_type) = rule(headers)? {
            debug!("Classified message as {report_type}");
            return Ok(report_type);
        }
    }

    Ok(ReportType::Unknown)
}

fn non_empty(headers: &[MailHeader<'_>], name: &str) -> bool {
    headers
        .get_first_value(name)
        .is_some_and(|value| !value.trim().is_empty())
}

#[allow(clippy::unnecessary_wraps)]
fn vendor_daemon_rule(headers: &[MailHeader<'_>]) -> Result<Option<ReportType>> {
    Ok((non_empty(headers, DAEMON_ERROR_HEADER) && non_empty(headers, DAEMON_RECIPIENTS_HEADER))
        .then_some(ReportType::VendorDaemon))
}

fn multipart_report_rule(headers: &[MailHeader<'_>]) -> Result<Option<ReportType>> {
    let Some(param) = multipart_report_type(headers)? else {
        return Ok(None);
    };

    Ok(REPORT_TYPES
        .iter()
        .find(|(name, _)| *name == param)
        .map(|(_, report_type)| *report_type))
}

/// `report-type` parameter of a `multipart/report` message, lowercased
fn multipart_report_type(headers: &[MailHeader<'_>]) -> Result<Option<String>> {
    let Some(value) = headers.get_first_value("Content-Type") else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(None);
    }

    let media_type = value.split(';').next().unwrap_or_default().trim();
    if !MEDIA_TYPE_REGEX.is_match(media_type) {
        return Err(ParseError::MalformedContentType(value));
    }

    let ctype = mailparse::parse_content_type(&value);
    if ctype.mimetype != "multipart/report" {
        return Ok(None);
    }

    Ok(ctype
        .params
        .get("report-type")
        .map(|report_type| report_type.trim().to_ascii_lowercase()))
}
