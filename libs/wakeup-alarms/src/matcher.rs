//! Minute matching rule
//!
//! An alarm fires when the wall clock's hour and minute equal the alarm's,
//! the second is inside the first [`TRIGGER_WINDOW_SECS`] of that minute, and
//! today's weekday slot is set (or the mask is empty).

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::types::Alarm;

/// Seconds after the top of the minute during which an alarm may fire
pub const TRIGGER_WINDOW_SECS: u32 = 10;

/// Decide whether `alarm` fires at local time `now`
///
/// Pure; does not look at `is_active`. A mask shorter than seven slots
/// reads missing days as unset.
pub fn should_trigger(now: NaiveDateTime, alarm: &Alarm) -> bool {
    if now.hour() != alarm.time.hour() || now.minute() != alarm.time.minute() {
        return false;
    }

    if now.second() >= TRIGGER_WINDOW_SECS {
        return false;
    }

    if alarm.repeat_days.is_empty() {
        return true;
    }

    let weekday = now.weekday().num_days_from_monday() as usize;
    alarm.repeat_days.get(weekday).copied().unwrap_or(false)
}

/// The minute `now` falls in, used to fire each alarm at most once per minute
pub fn trigger_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}
