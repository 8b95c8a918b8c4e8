//! # Date Parsing
//!
//! Lenient timestamp parsing for list columns. Everything is normalized to
//! the runtime's local zone so window comparisons stay consistent.
//!
//! ## Accepted Shapes
//! ```text
//! "2025-12-01T09:30:00Z"       RFC 3339          → converted to Local
//! "2025-12-01T09:30:00+02:00"  RFC 3339          → converted to Local
//! "2025-12-01T09:30:00"        naive date-time   → Local wall time
//! "2025-12-01 09:30:00"        naive date-time   → Local wall time
//! "2025-12-01"                 date only         → Local midnight
//! "12/01/2025"                 US date           → Local midnight
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Milliseconds in one calendar day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses a provider timestamp into the local zone.
///
/// Returns `None` for empty or unrecognized input.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return local_from_naive(naive);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return local_from_naive(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// Resolves a naive wall time in the local zone.
///
/// DST gaps have no local instant; the earliest valid mapping is used for
/// ambiguous times and the gap case yields `None`.
fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

/// Whole days from `now` until `then`, rounded up, via millisecond arithmetic.
pub fn days_until_ceil(now: DateTime<Local>, then: DateTime<Local>) -> i64 {
    let ms = (then - now).num_milliseconds();
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0)
}
