//! Report builders, one per bounce dialect

use crate::classify::{DAEMON_ERROR_HEADER, DAEMON_RECIPIENTS_HEADER, classify};
use crate::date::parse_date;
use crate::embedded::{HeaderSource, address_from};
use crate::error::{ParseError, Result};
use crate::types::{MessageId, Report, ReportType};
use mailparse::{MailHeader, MailHeaderMap, ParsedMail};
use tracing::debug;

/// Vendor tag copied from the original message into [`Report::postmaster_msg_type`]
pub const POSTMASTER_MSGTYPE_HEADER: &str = "X-Postmaster-Msgtype";

type Builder = for<'a> fn(&'a ParsedMail<'a>, ReportType) -> Result<Report>;

/// Parse raw message bytes into a bounce report
///
/// Returns `Ok(None)` when the message is not a report dialect we read.
pub fn parse_report(raw: &[u8]) -> Result<Option<Report>> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| ParseError::Structure(e.to_string()))?;
    let report_type = classify(&parsed.headers)?;
    build_report(&parsed, report_type)
}

/// Run the builder that belongs to `report_type`
pub fn build_report(mail: &ParsedMail<'_>, report_type: ReportType) -> Result<Option<Report>> {
    let Some(builder) = builder_for(report_type) else {
        debug!("No report for {report_type} message");
        return Ok(None);
    };

    let report = builder(mail, report_type)?;
    debug!(
        "Parsed {} report for {} from {}",
        report.report_type, report.recipient.address, report.reporter.address
    );
    Ok(Some(report))
}

fn builder_for(report_type: ReportType) -> Option<Builder> {
    match report_type {
        ReportType::DeliveryStatus | ReportType::Feedback => {
            Some(build_standard_report as Builder)
        }
        ReportType::VendorDaemon => Some(build_daemon_report as Builder),
        ReportType::Unknown => None,
    }
}

/// DSN and feedback-loop reports: original headers sit in an rfc822 part
fn build_standard_report(mail: &ParsedMail<'_>, report_type: ReportType) -> Result<Report> {
    let reporter = address_from(&mail.headers, "From")?;
    let date = parse_date(&header_value(&mail.headers, "Date"))?;
    let message = header_value(&mail.headers, "Subject");

    let embedded = HeaderSource::Rfc822Part.extract(mail)?;
    let original = embedded.headers()?;
    let recipient = address_from(&original, "To")?;
    let sender = address_from(&original, "From")?;

    Ok(Report {
        id: String::new(),
        date,
        reporter,
        sender,
        recipient,
        report_type,
        message_id: MessageId::new(header_value(&original, "Message-ID")),
        postmaster_msg_type: header_value(&original, POSTMASTER_MSGTYPE_HEADER),
        message,
    })
}

/// Vendor daemon bounces: failure facts in `X-Mailer-Daemon-*`, original
/// headers pasted into the body text
fn build_daemon_report(mail: &ParsedMail<'_>, report_type: ReportType) -> Result<Report> {
    let reporter = address_from(&mail.headers, "From")?;
    let recipient = address_from(&mail.headers, DAEMON_RECIPIENTS_HEADER)?;
    let date = parse_date(&header_value(&mail.headers, "Date"))?;
    let message = raw_header_value(&mail.headers, DAEMON_ERROR_HEADER);

    let embedded = HeaderSource::FreeText.extract(mail)?;
    let original = embedded.headers()?;
    let sender = address_from(&original, "From")?;

    Ok(Report {
        id: String::new(),
        date,
        reporter,
        sender,
        recipient,
        report_type,
        message_id: MessageId::new(header_value(&original, "Message-ID")),
        postmaster_msg_type: header_value(&original, POSTMASTER_MSGTYPE_HEADER),
        message,
    })
}

/// First value of `name` with encoded words decoded, empty when missing
fn header_value(headers: &[MailHeader<'_>], name: &str) -> String {
    headers
        .get_first_value(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// First value of `name` unfolded but otherwise untouched
fn raw_header_value(headers: &[MailHeader<'_>], name: &str) -> String {
    headers
        .get_first_header(name)
        .map(|header| {
            String::from_utf8_lossy(header.get_value_raw())
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
