//! Wall-clock helpers for shop-floor time entries.
//!
//! Times of day are entered as free-form 12-hour strings (`"H:MM AM/PM"`).
//! Plain 24-hour `"HH:MM"` strings are accepted as well because the plant
//! report spreadsheets use them.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// First hour of the day shift (inclusive).
pub const DAY_SHIFT_START: u32 = 6;
/// First hour of the night shift (inclusive).
pub const DAY_SHIFT_END: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    Day,
    Night,
}

impl Shift {
    /// Shift a measurement taken at `time` belongs to.
    pub fn at(time: NaiveTime) -> Self {
        let hour = time.hour();
        if (DAY_SHIFT_START..DAY_SHIFT_END).contains(&hour) {
            Shift::Day
        } else {
            Shift::Night
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "Day",
            Shift::Night => "Night",
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Shift::Day),
            "night" => Ok(Shift::Night),
            _ => Err(format!("Invalid shift: {}", s)),
        }
    }
}

/// Minutes since midnight for a `"H:MM AM/PM"` or `"HH:MM"` string.
pub fn minutes_since_midnight(time_str: &str) -> Option<i64> {
    let mut parts = time_str.split_whitespace();
    let clock = parts.next()?;
    let meridiem = parts.next();

    let (hours, minutes) = clock.split_once(':')?;
    let mut hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;

    if !(0..60).contains(&minutes) {
        return None;
    }

    match meridiem {
        Some(m) if m.eq_ignore_ascii_case("PM") => {
            if !(1..=12).contains(&hours) {
                return None;
            }
            if hours < 12 {
                hours += 12;
            }
        }
        Some(m) if m.eq_ignore_ascii_case("AM") => {
            if !(1..=12).contains(&hours) {
                return None;
            }
            if hours == 12 {
                hours = 0;
            }
        }
        Some(_) => return None,
        None => {
            if !(0..24).contains(&hours) {
                return None;
            }
        }
    }

    Some(hours * 60 + minutes)
}

/// Minutes elapsed from `start` to `end`, wrapping past midnight.
pub fn time_difference_minutes(start: &str, end: &str) -> Option<i64> {
    let start = minutes_since_midnight(start)?;
    let end = minutes_since_midnight(end)?;

    let mut diff = end - start;
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }
    Some(diff)
}

/// Render a minute count as `"Xh Ym"`.
pub fn format_duration(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Elapsed time between two time-of-day strings as `"Xh Ym"`.
///
/// An end time earlier than the start time is taken to be on the next day.
/// Empty or unparseable input yields `"0h 0m"`.
pub fn calculate_time_difference(start: &str, end: &str) -> String {
    match time_difference_minutes(start, end) {
        Some(diff) => format_duration(diff),
        None => format_duration(0),
    }
}

/// Format a time as `"H:MM AM/PM"`.
pub fn format_time_string(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let meridiem = if pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour, time.minute(), meridiem)
}

/// Parse a `"H:MM AM/PM"` or `"HH:MM"` string into a time of day.
pub fn parse_time_string(time_str: &str) -> Option<NaiveTime> {
    let minutes = minutes_since_midnight(time_str)?;
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
}

/// Strict check for the 12-hour entry format, e.g. `"9:05 AM"` or `"12:30 PM"`.
pub fn is_valid_time_format(time_str: &str) -> bool {
    let Some((clock, meridiem)) = time_str.split_once(' ') else {
        return false;
    };
    if meridiem != "AM" && meridiem != "PM" {
        return false;
    }
    let Some((hours, minutes)) = clock.split_once(':') else {
        return false;
    };

    let hours_ok = match hours.len() {
        1 => matches!(hours.as_bytes()[0], b'1'..=b'9'),
        2 => matches!(hours, "01" | "02" | "03" | "04" | "05" | "06" | "07" | "08" | "09" | "10" | "11" | "12"),
        _ => false,
    };
    let minutes_ok = minutes.len() == 2
        && matches!(minutes.as_bytes()[0], b'0'..=b'5')
        && minutes.as_bytes()[1].is_ascii_digit();

    hours_ok && minutes_ok
}
