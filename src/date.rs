//! Tolerant date parsing for bounce headers and body text
//!
//! Report generators disagree on whether to include the weekday and on
//! numeric versus named zones. The first date-shaped substring is pulled out
//! of the input and then tried against [`LAYOUTS`] in order.

use crate::error::{ParseError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;
use tracing::trace;

static DATE_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(
        r"(?:[A-Za-z]{3},\s*)?[0-9]{1,2}\s+[A-Za-z]{3}\s+[0-9]{4}\s+[0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2}\s+(?:[+-][0-9]{4}|[A-Za-z]{2,4}\b)",
    )
    .unwrap()
});

const DATE_TIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// How the zone is written at the end of a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneStyle {
    /// `+0300`
    Numeric,
    /// `GMT`, `MSK`, ...
    Named,
}

/// One accepted date shape
#[derive(Debug, Clone, Copy)]
struct DateLayout {
    weekday: bool,
    zone: ZoneStyle,
}

/// Tried in order, first success wins
const LAYOUTS: [DateLayout; 4] = [
    DateLayout {
        weekday: true,
        zone: ZoneStyle::Numeric,
    },
    DateLayout {
        weekday: false,
        zone: ZoneStyle::Numeric,
    },
    DateLayout {
        weekday: true,
        zone: ZoneStyle::Named,
    },
    DateLayout {
        weekday: false,
        zone: ZoneStyle::Named,
    },
];

/// Zone abbreviations and their offset east of UTC, in hours
const NAMED_ZONES: [(&str, i32); 19] = [
    ("UT", 0),
    ("UTC", 0),
    ("GMT", 0),
    ("WET", 0),
    ("BST", 1),
    ("CET", 1),
    ("CEST", 2),
    ("EET", 2),
    ("EEST", 3),
    ("MSK", 3),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
    ("JST", 9),
];

/// Resolve a zone abbreviation through the fixed lookup table
#[must_use]
pub fn zone_offset(name: &str) -> Option<FixedOffset> {
    NAMED_ZONES
        .iter()
        .find(|(zone, _)| zone.eq_ignore_ascii_case(name))
        .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600))
}

/// Find and parse the first date in `input`
///
/// The input may carry surrounding text, such as a folded header or a
/// trailing `(MSK)` comment.
pub fn parse_date(input: &str) -> Result<DateTime<FixedOffset>> {
    let found = DATE_REGEX
        .find(input)
        .ok_or_else(|| ParseError::UnparseableDate(input.trim().to_string()))?;
    let candidate = found.as_str().split_whitespace().collect::<Vec<_>>().join(" ");

    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(&candidate))
        .ok_or(ParseError::UnparseableDate(candidate))
}

impl DateLayout {
    fn parse(self, candidate: &str) -> Option<DateTime<FixedOffset>> {
        let rest = if self.weekday {
            strip_weekday(candidate)?
        } else {
            candidate
        };

        let parsed = match self.zone {
            ZoneStyle::Numeric => {
                DateTime::parse_from_str(rest, &format!("{DATE_TIME_FORMAT} %z")).ok()
            }
            ZoneStyle::Named => {
                let (local, zone) = rest.rsplit_once(' ')?;
                let offset = zone_offset(zone)?;
                let naive = NaiveDateTime::parse_from_str(local, DATE_TIME_FORMAT).ok()?;
                offset.from_local_datetime(&naive).single()
            }
        };

        if parsed.is_some() {
            trace!("Parsed date {candidate:?} with {self:?}");
        }
        parsed
    }
}

/// Remove a leading `Mon,` style weekday, which is not checked against the date
fn strip_weekday(candidate: &str) -> Option<&str> {
    let (weekday, rest) = candidate.split_once(',')?;
    let weekday = weekday.trim().to_ascii_lowercase();
    WEEKDAYS
        .contains(&weekday.as_str())
        .then_some(rest.trim_start())
}
