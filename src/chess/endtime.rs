//! Game completion time for pasted PGN.
//!
//! Missing or unreadable parts fall back to the current local date or time,
//! and the assembled timestamp is read in the local timezone even when the
//! headers were UTC. The result is best-effort, not authoritative.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::warn;

fn normalize_date_separators(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_ascii_digit() || c == '?' { c } else { '-' })
        .collect()
}

fn parse_date_field(raw: &str) -> Option<NaiveDate> {
    let norm = normalize_date_separators(raw);
    NaiveDate::parse_from_str(&norm, "%Y-%m-%d").ok()
}

// Keeps the leading `HH:MM:SS` of values such as "11:05:37 GMT+0000" or "11:05:37.5Z".
fn parse_time_field(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    let head: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    NaiveTime::parse_from_str(&head, "%H:%M:%S").ok()
}

/// Resolves `date` (`UTCDate`/`Date`) and `time` (`EndTime`/`UTCTime`) into
/// epoch seconds, using `now` for whatever is missing.
pub fn resolve_end_time(date: Option<&str>, time: Option<&str>, now: DateTime<Local>) -> i64 {
    let resolved_date = match date {
        Some(raw) => parse_date_field(raw).unwrap_or_else(|| {
            warn!(date = raw, "Conversion error: unreadable date, using current date");
            now.date_naive()
        }),
        None => now.date_naive(),
    };

    let resolved_time = match time {
        Some(raw) => parse_time_field(raw).unwrap_or_else(|| {
            warn!(time = raw, "Conversion error: unreadable time, using current time");
            now.time()
        }),
        None => now.time(),
    };

    local_timestamp(NaiveDateTime::new(resolved_date, resolved_time))
        .unwrap_or_else(|| now.timestamp())
}

// Local wall-clock time to epoch seconds. Times skipped by a DST jump have no
// local instant; the caller falls back to `now`.
fn local_timestamp(naive: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
}
