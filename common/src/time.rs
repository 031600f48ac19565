// A simple module to define the time types used in the project
//
// Every ledger operation receives its "now" from the caller (or the daemon clock),
// the helpers below only turn timestamps into whole days and calendar days.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::config::SECONDS_PER_DAY;

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

#[inline]
pub fn get_current_time() -> Duration {
    let start = SystemTime::now();

    // A clock set before 1970 is treated as the epoch itself
    start.duration_since(UNIX_EPOCH).unwrap_or_default()
}

// Return timestamp in seconds
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}

/// Number of whole days elapsed between `from` and `to`.
/// Returns 0 when `to` is not after `from`.
pub fn whole_days_between(from: TimestampSeconds, to: TimestampSeconds) -> u64 {
    to.saturating_sub(from) / SECONDS_PER_DAY
}

/// Calendar date of a timestamp in the platform time zone.
///
/// `utc_offset_secs` is the fixed offset of the platform time zone,
/// an out of range offset falls back to UTC.
pub fn calendar_day(timestamp: TimestampSeconds, utc_offset_secs: i32) -> NaiveDate {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());

    let seconds = i64::try_from(timestamp).unwrap_or(i64::MAX);
    let utc: DateTime<Utc> = DateTime::from_timestamp(seconds, 0).unwrap_or_default();
    utc.with_timezone(&offset).date_naive()
}

/// Returns true if both timestamps fall on the same calendar day
pub fn is_same_calendar_day(a: TimestampSeconds, b: TimestampSeconds, utc_offset_secs: i32) -> bool {
    calendar_day(a, utc_offset_secs) == calendar_day(b, utc_offset_secs)
}
