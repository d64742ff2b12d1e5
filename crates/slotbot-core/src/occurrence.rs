use crate::types::Day;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

/// Next absolute date-time at which the weekly `day`/`time` slot occurs,
/// seen from `now`.
///
/// Today qualifies only while the slot's time is still ahead at minute
/// granularity; a slot at or before the current `(hour, minute)` is treated
/// as passed and lands a full week out. The result is always 0..=7 days
/// ahead of `now`.
pub fn next_occurrence(day: Day, time: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let target = i64::from(day.weekday().num_days_from_monday());
    let current = i64::from(now.weekday().num_days_from_monday());
    let mut ahead = (target - current).rem_euclid(7);
    if ahead == 0 && (now.hour(), now.minute()) >= (time.hour(), time.minute()) {
        ahead = 7;
    }
    (now.date() + Duration::days(ahead)).and_time(time)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
