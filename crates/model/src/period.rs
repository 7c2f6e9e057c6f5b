use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use thiserror::Error;

/// Layout used when window bounds are written into query text.
const QUERY_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid date/time '{0}': expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS[.fff] or RFC 3339")]
pub struct InstantParseError(pub String);

/// The `[from, to]` range of sales a cycle or a pull request extracts.
/// Bounds are local wall-clock times, as stored by the point-of-sale database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl ReportWindow {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        ReportWindow { from, to }
    }

    /// Window starting at midnight of `from_day` and closing at the last
    /// millisecond of `to_day`.
    pub fn through_end_of_day(from_day: NaiveDate, to_day: NaiveDate) -> Self {
        ReportWindow {
            from: from_day.and_time(NaiveTime::MIN),
            to: end_of_day(to_day),
        }
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", query_layout(&self.from), query_layout(&self.to))
    }
}

/// 23:59:59.999 of the given day.
pub fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN))
}

/// `YYYY-MM-DDTHH:MM:SS` followed by milliseconds with trailing zeros removed
/// (`.999`, `.5`, or nothing at all on a whole second).
pub fn query_layout(instant: &NaiveDateTime) -> String {
    let mut text = instant.format(QUERY_LAYOUT).to_string();
    let millis = instant.nanosecond() / 1_000_000 % 1000;
    if millis > 0 {
        let frac = format!("{millis:03}");
        text.push('.');
        text.push_str(frac.trim_end_matches('0'));
    }
    text
}

/// Parses the date/time forms the collector and pull clients send.
/// RFC 3339 values keep their wall-clock time and drop the offset.
pub fn parse_instant(text: &str) -> Result<NaiveDateTime, InstantParseError> {
    let text = text.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }

    Err(InstantParseError(text.to_string()))
}
