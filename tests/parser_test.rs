use bounce_extract::*;
use chrono::{FixedOffset, TimeZone};

const DAEMON: &[u8] = include_bytes!("fixtures/mail_ru_invalid_mailbox.eml");
const FBL: &[u8] = include_bytes!("fixtures/mail_ru_report_fbl.eml");
const DSN: &[u8] = include_bytes!("fixtures/atomsbt_ru_report_delivery_status.eml");
const DSN_ENCODED_REPORTER: &[u8] = include_bytes!("fixtures/mvd_ru_report_delivery_status.eml");
const DSN_HEADERS_ONLY: &[u8] = include_bytes!("fixtures/tnt_com_report_delivery_status.eml");

fn msk() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

#[test]
fn test_parse_vendor_daemon_bounce() {
    let report = parse_report(DAEMON).unwrap().unwrap();

    assert_eq!(report.report_type, ReportType::VendorDaemon);
    assert_eq!(
        report.date,
        msk().with_ymd_and_hms(2022, 7, 15, 16, 40, 55).unwrap()
    );
    assert_eq!(
        report.reporter,
        EmailAddress::new("", "mailer-daemon@corp.mail.ru")
    );
    assert_eq!(report.sender, EmailAddress::new("Sender", "sender@domain.tld"));
    assert_eq!(report.recipient, EmailAddress::new("", "recipient@domain.tld"));
    assert_eq!(
        report.message_id.as_str(),
        "<16578924547016.111222333@gonder>"
    );
    assert_eq!(report.postmaster_msg_type, "campaign7016");
    assert_eq!(report.message, "user_not_found");
    assert!(report.id.is_empty());
}

#[test]
fn test_parse_feedback_loop_report() {
    let report = parse_report(FBL).unwrap().unwrap();

    assert_eq!(report.report_type, ReportType::Feedback);
    assert_eq!(
        report.date,
        msk().with_ymd_and_hms(2022, 7, 19, 21, 9, 46).unwrap()
    );
    assert_eq!(report.reporter, EmailAddress::new("", "noreply@corp.mail.ru"));
    assert_eq!(report.sender, EmailAddress::new("Sender", "sender@domain.tld"));
    assert_eq!(report.recipient, EmailAddress::new("", "recipient@domain.tld"));
    assert_eq!(
        report.message_id.as_str(),
        "<16093366945646.54672397@gonder>"
    );
    assert_eq!(report.postmaster_msg_type, "campaign5646");
    assert_eq!(report.message, "Mail.ru abuse report (Feedback Loop)");
}

#[test]
fn test_parse_delivery_status_uses_embedded_headers() {
    let report = parse_report(DSN).unwrap().unwrap();

    assert_eq!(report.report_type, ReportType::DeliveryStatus);
    assert_eq!(
        report.date,
        msk().with_ymd_and_hms(2019, 4, 8, 16, 55, 7).unwrap()
    );
    assert_eq!(report.reporter, EmailAddress::new("", "postmaster@atomsbt.ru"));
    // Outer To and X-Postmaster-Msgtype belong to the bounce, not the original
    assert_eq!(report.recipient, EmailAddress::new("", "recipient@domain.tld"));
    assert_eq!(report.sender, EmailAddress::new("Sender", "sender@domain.tld"));
    assert_eq!(
        report.message_id.as_str(),
        "<15547288993611.20249452@gonder>"
    );
    assert_eq!(report.postmaster_msg_type, "campaign3611");
}

#[test]
fn test_parse_delivery_status_decodes_subject() {
    let report = parse_report(DSN).unwrap().unwrap();
    assert_eq!(
        report.message,
        "Undeliverable: [!!Mass Mail]Выиграйте поездку на завод Nissan!"
    );
}

#[test]
fn test_parse_delivery_status_with_encoded_reporter_name() {
    let report = parse_report(DSN_ENCODED_REPORTER).unwrap().unwrap();

    assert_eq!(
        report.reporter,
        EmailAddress::new("ЕЦЭ ИСОД МВД России", "helpdesk@mvd.ru")
    );
    assert_eq!(
        report.date,
        msk().with_ymd_and_hms(2021, 12, 22, 16, 43, 14).unwrap()
    );
    assert_eq!(report.recipient, EmailAddress::new("", "recipient@domain.tld"));
    assert_eq!(
        report.message_id.as_str(),
        "<16401805916732.72318109@gonder>"
    );
    assert_eq!(report.postmaster_msg_type, "campaign6732");
    assert_eq!(report.message, "Почта не может быть доставлена получателю");
}

#[test]
fn test_parse_delivery_status_with_rfc822_headers_part() {
    let report = parse_report(DSN_HEADERS_ONLY).unwrap().unwrap();

    assert_eq!(report.report_type, ReportType::DeliveryStatus);
    assert_eq!(report.reporter, EmailAddress::new("", "Postmaster@tnt.com"));
    assert_eq!(
        report.recipient,
        EmailAddress::new("Recipient", "recipient@domain.tld")
    );
    assert_eq!(
        report.message_id.as_str(),
        "<OFC740BF7C.982022CF-ON802583D6.004E7815-802583D6.004E7835@tnt.com>"
    );
    assert_eq!(
        report.sender,
        EmailAddress::new("Sender", "sender@domain.tld")
    );
    assert_eq!(report.postmaster_msg_type, "campaign3611");
    assert_eq!(
        report.message,
        "DELIVERY FAILURE: User recipient (recipient@domain.tld) not listed in Domino Directory"
    );

    // GMT date, same instant as 17:16:56 +0300
    let expected = msk().with_ymd_and_hms(2019, 4, 8, 17, 16, 56).unwrap();
    assert_eq!(report.date.timestamp(), expected.timestamp());
    assert_eq!(report.date.offset().local_minus_utc(), 0);
}

#[test]
fn test_parse_is_idempotent() {
    for raw in [DAEMON, FBL, DSN, DSN_ENCODED_REPORTER, DSN_HEADERS_ONLY] {
        let first = parse_report(raw).unwrap();
        let second = parse_report(raw).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_plain_message_yields_no_report() {
    let raw = b"From: John Doe <john@example.com>\r\n\
                To: recipient@example.com\r\n\
                Subject: Test Email\r\n\
                Date: Thu, 01 Jan 2025 12:00:00 +0000\r\n\
                Message-ID: <test123@example.com>\r\n\
                \r\n\
                Hello, this is a test email.";

    assert_eq!(parse_report(raw), Ok(None));
}

#[test]
fn test_plain_message_with_header_shaped_body_yields_no_report() {
    let raw = b"From: sender@example.com\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                Quoted:\r\n\
                \r\n\
                From: someone@example.com\r\n\
                Message-ID: <quoted@example.com>\r\n";

    assert_eq!(parse_report(raw), Ok(None));
}

#[test]
fn test_malformed_content_type_is_an_error() {
    let raw = b"From: sender@example.com\r\n\
                Content-Type: report\r\n\
                \r\n\
                Body";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::MalformedContentType(_))
    ));
}

#[test]
fn test_delivery_status_without_rfc822_part() {
    let raw = b"From: postmaster@example.com\r\n\
                Date: Mon, 8 Apr 2019 16:55:07 +0300\r\n\
                Subject: Undeliverable\r\n\
                Content-Type: multipart/report; report-type=delivery-status; boundary=\"b\"\r\n\
                \r\n\
                --b\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                Delivery failed.\r\n\
                --b\r\n\
                Content-Type: message/delivery-status\r\n\
                \r\n\
                Final-Recipient: rfc822;recipient@example.com\r\n\
                Action: failed\r\n\
                --b--\r\n";

    assert_eq!(parse_report(raw), Err(ParseError::EmbeddedHeadersNotFound));
}

#[test]
fn test_unparseable_reporter_aborts_build() {
    let raw = b"From: postmaster\r\n\
                Date: Mon, 8 Apr 2019 16:55:07 +0300\r\n\
                X-Mailer-Daemon-Error: user_not_found\r\n\
                X-Mailer-Daemon-Recipients: recipient@example.com\r\n\
                \r\n\
                Failed.\r\n\
                \r\n\
                From: sender@example.com\r\n\
                Message-ID: <id@example.com>\r\n";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::UnparseableAddress { header, .. }) if header == "From"
    ));
}

#[test]
fn test_missing_date_aborts_build() {
    let raw = b"From: mailer-daemon@example.com\r\n\
                X-Mailer-Daemon-Error: user_not_found\r\n\
                X-Mailer-Daemon-Recipients: recipient@example.com\r\n\
                \r\n\
                Failed.\r\n\
                \r\n\
                From: sender@example.com\r\n\
                Message-ID: <id@example.com>\r\n";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::UnparseableDate(_))
    ));
}

#[test]
fn test_vendor_daemon_without_embedded_headers() {
    let raw = b"From: mailer-daemon@example.com\r\n\
                Date: Fri, 15 Jul 2022 16:40:55 +0300\r\n\
                X-Mailer-Daemon-Error: user_not_found\r\n\
                X-Mailer-Daemon-Recipients: recipient@example.com\r\n\
                \r\n\
                The message could not be delivered.\r\n";

    assert_eq!(parse_report(raw), Err(ParseError::EmbeddedHeadersNotFound));
}

#[test]
fn test_vendor_daemon_with_undecodable_body() {
    let raw = b"From: mailer-daemon@example.com\r\n\
                Date: Fri, 15 Jul 2022 16:40:55 +0300\r\n\
                X-Mailer-Daemon-Error: user_not_found\r\n\
                X-Mailer-Daemon-Recipients: recipient@example.com\r\n\
                Content-Type: text/plain\r\n\
                Content-Transfer-Encoding: base64\r\n\
                \r\n\
                !!!@@@###\r\n";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::DecodeFailure(_))
    ));
}

#[test]
fn test_delivery_status_with_undecodable_rfc822_part() {
    let raw = b"From: postmaster@example.com\r\n\
                Date: Mon, 8 Apr 2019 16:55:07 +0300\r\n\
                Subject: Undeliverable\r\n\
                Content-Type: multipart/report; report-type=delivery-status; boundary=\"b\"\r\n\
                \r\n\
                --b\r\n\
                Content-Type: message/rfc822\r\n\
                Content-Transfer-Encoding: base64\r\n\
                \r\n\
                !!!@@@###\r\n\
                --b--\r\n";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::DecodeFailure(_))
    ));
}

#[test]
fn test_delivery_status_with_malformed_embedded_headers() {
    let raw = b"From: postmaster@example.com\r\n\
                Date: Mon, 8 Apr 2019 16:55:07 +0300\r\n\
                Subject: Undeliverable\r\n\
                Content-Type: multipart/report; report-type=delivery-status; boundary=\"b\"\r\n\
                \r\n\
                --b\r\n\
                Content-Type: message/rfc822\r\n\
                \r\n\
                \x20From: sender@example.com\r\n\
                --b--\r\n";

    assert!(matches!(
        parse_report(raw),
        Err(ParseError::Structure(_))
    ));
}

#[test]
fn test_build_delivery_status_on_single_part_message() {
    let raw = b"From: postmaster@example.com\r\n\
                Date: Mon, 8 Apr 2019 16:55:07 +0300\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                Not a report.";
    let mail = mailparse::parse_mail(raw).unwrap();

    assert_eq!(
        build_report(&mail, ReportType::DeliveryStatus),
        Err(ParseError::NotMultipart)
    );
    assert_eq!(build_report(&mail, ReportType::Unknown), Ok(None));
}

#[test]
fn test_record_rendering() {
    let report = parse_report(DAEMON).unwrap().unwrap().with_id("<42@imap>");
    let record = report.to_record();

    assert_eq!(record.id, "<42@imap>");
    assert_eq!(record.date, "2022-07-15T16:40:55+03:00");
    assert_eq!(record.reporter, "<mailer-daemon@corp.mail.ru>");
    assert_eq!(record.sender, "\"Sender\" <sender@domain.tld>");
    assert_eq!(record.recipient, "<recipient@domain.tld>");
    assert_eq!(record.report_type, "X-Mailer");
    assert_eq!(record.message_id, "<16578924547016.111222333@gonder>");
    assert_eq!(record.postmaster_msg_type, "campaign7016");
    assert_eq!(record.message, "user_not_found");
}
