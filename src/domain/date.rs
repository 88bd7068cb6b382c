//! Date and time stamp handling
//!
//! Stamps in the outline are `YYYY-MM-DD` with an optional ` HH:MM`.
//! A due date without a time means end of day (23:59); a visible date
//! without a time means start of day (00:01), so a bare date behaves
//! the way a human reads it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Canonical stamp format used by `(DONE ...)` and `(LASTDONE ...)`.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// An explicit due date together with its optional lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueStamp {
    /// The deadline itself.
    pub at: NaiveDateTime,
    /// Days before `at` at which the item should already be surfaced.
    /// Kept as a secondary attribute; never folded into min-aggregation.
    pub lead_days: Option<u32>,
}

/// Builds a time of day, falling back to midnight on invalid input.
pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Default time for a due date given without one: end of day.
pub fn due_default_time() -> NaiveTime {
    hm(23, 59)
}

/// Default time for a visible date given without one: start of day.
pub fn visible_default_time() -> NaiveTime {
    hm(0, 1)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, STAMP_FORMAT).ok()
}

pub fn format_stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Humanizes the distance between two instants: "just now", "5 minutes",
/// "3 days", "2 weeks". The direction is up to the caller's label.
pub fn humanize(a: NaiveDateTime, b: NaiveDateTime) -> String {
    let secs = (a - b).num_seconds().abs();
    let days = secs / 86_400;
    if days == 0 {
        let rem = secs % 86_400;
        if rem < 10 {
            "just now".to_string()
        } else if rem < 60 {
            pluralize(rem, "second")
        } else if rem < 3_600 {
            pluralize(rem / 60, "minute")
        } else {
            pluralize(rem / 3_600, "hour")
        }
    } else if days < 7 {
        pluralize(days, "day")
    } else if days < 31 {
        pluralize(days / 7, "week")
    } else if days < 365 {
        pluralize(days / 30, "month")
    } else {
        pluralize(days / 365, "year")
    }
}
