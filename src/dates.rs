//! Calendar-day arithmetic for the hotel's local timezone.
//!
//! Stay boundaries are calendar dates, not instants; every comparison in the
//! engine goes through this module with an explicit reference instant so the
//! logic is deterministic under test and timezone handling lives in exactly
//! one place.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Converts an instant to the hotel-local calendar date.
///
/// `offset_minutes` is the hotel's fixed UTC offset (east positive), taken
/// from configuration. Falls back to UTC if the offset is out of range.
pub fn local_today(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    match FixedOffset::east_opt(offset_minutes * 60) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// Number of nights between two stay boundaries in whole days.
///
/// Returns `None` when `check_out` is not strictly after `check_in`; a valid
/// stay is always at least one night.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> Option<i32> {
    let nights = (check_out - check_in).num_days();
    if nights >= 1 {
        Some(nights as i32)
    } else {
        None
    }
}

/// Midnight at the start of a hotel-local date, as a UTC instant.
///
/// Used when a legacy repair needs to backfill a missing check-out instant
/// from a scheduled date.
pub fn start_of_local_day(date: NaiveDate, offset_minutes: i32) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc)
        - Duration::minutes(offset_minutes as i64)
}
