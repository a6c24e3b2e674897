//! Thin adapter over `chrono` supplying the date arithmetic the timeline needs:
//! parsing, unit arithmetic, diffs in seconds, unit comparison and
//! moment-style formatting.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

pub type Timestamp = NaiveDateTime;

pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;
pub const DAYS_PER_WEEK: i64 = 7;

/// Format used when edited dates are written back to the data store.
pub const STORAGE_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";
/// Format used for window bounds after zoom and pan.
pub const WINDOW_FORMAT: &str = "YYYY-MM-DD";

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|DDDD|DDD|DD|D|dddd|ddd|dd|d|HH|H|hh|h|mm|m|ss|s|A|a|ww|w")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Some(Self::Days),
            "weeks" | "week" | "w" => Some(Self::Weeks),
            _ => None,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Days => 1,
            Self::Weeks => DAYS_PER_WEEK,
        }
    }

    pub fn seconds(self) -> i64 {
        self.days() * SECONDS_PER_DAY
    }
}

pub fn now() -> Timestamp {
    chrono::Local::now().naive_local()
}

pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.with_nanosecond(0).unwrap_or(ts));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

pub fn start_of_day(ts: Timestamp) -> Timestamp {
    ts.date().and_time(NaiveTime::MIN)
}

pub fn add_seconds(ts: Timestamp, seconds: i64) -> Option<Timestamp> {
    ts.checked_add_signed(Duration::try_seconds(seconds)?)
}

pub fn add_days(ts: Timestamp, days: i64) -> Option<Timestamp> {
    ts.checked_add_signed(Duration::try_days(days)?)
}

pub fn add_units(ts: Timestamp, count: i64, unit: TimeUnit) -> Option<Timestamp> {
    add_days(ts, count.checked_mul(unit.days())?)
}

/// Signed number of seconds from `from` to `to`.
pub fn diff_seconds(to: Timestamp, from: Timestamp) -> i64 {
    (to - from).num_seconds()
}

/// Start of the calendar unit containing `ts`. Weeks start on Monday.
pub fn truncate_to_unit(ts: Timestamp, unit: TimeUnit) -> Timestamp {
    let day = start_of_day(ts);
    match unit {
        TimeUnit::Days => day,
        TimeUnit::Weeks => {
            let back = ts.weekday().num_days_from_monday() as i64;
            add_days(day, -back).unwrap_or(day)
        }
    }
}

pub fn same_unit(a: Timestamp, b: Timestamp, unit: TimeUnit) -> bool {
    truncate_to_unit(a, unit) == truncate_to_unit(b, unit)
}

/// Rounds the minute to the nearest multiple of `grid_minutes` and zeroes the
/// seconds. A rounded value of 60 carries into the next hour.
pub fn snap_to_grid(ts: Timestamp, grid_minutes: u32) -> Timestamp {
    let grid = grid_minutes.max(1) as f64;
    let rounded = ((ts.minute() as f64 / grid).round() * grid) as i64;
    let hour = ts
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts);
    hour.checked_add_signed(Duration::minutes(rounded))
        .unwrap_or(hour)
}

/// Formats `ts` with moment.js style tokens. Text inside `[...]` is literal.
pub fn format_timestamp(ts: Timestamp, pattern: &str) -> String {
    TOKEN_RE
        .replace_all(pattern, |caps: &Captures| format_token(ts, &caps[0]))
        .into_owned()
}

pub fn format_storage(ts: Timestamp) -> String {
    format_timestamp(ts, STORAGE_FORMAT)
}

fn format_token(ts: Timestamp, token: &str) -> String {
    if token.starts_with('[') {
        return token[1..token.len() - 1].to_string();
    }
    let hour12 = match ts.hour() % 12 {
        0 => 12,
        h => h,
    };
    let weekday = ts.weekday().num_days_from_sunday() as usize;
    let month = ts.month0() as usize;
    match token {
        "YYYY" => format!("{:04}", ts.year()),
        "YY" => format!("{:02}", ts.year().rem_euclid(100)),
        "MMMM" => MONTH_NAMES[month].to_string(),
        "MMM" => MONTH_NAMES[month][..3].to_string(),
        "MM" => format!("{:02}", ts.month()),
        "M" => ts.month().to_string(),
        "DDDD" => format!("{:03}", ts.ordinal()),
        "DDD" => ts.ordinal().to_string(),
        "DD" => format!("{:02}", ts.day()),
        "D" => ts.day().to_string(),
        "dddd" => WEEKDAY_NAMES[weekday].to_string(),
        "ddd" => WEEKDAY_NAMES[weekday][..3].to_string(),
        "dd" => WEEKDAY_NAMES[weekday][..2].to_string(),
        "d" => weekday.to_string(),
        "HH" => format!("{:02}", ts.hour()),
        "H" => ts.hour().to_string(),
        "hh" => format!("{:02}", hour12),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", ts.minute()),
        "m" => ts.minute().to_string(),
        "ss" => format!("{:02}", ts.second()),
        "s" => ts.second().to_string(),
        "A" => (if ts.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if ts.hour() < 12 { "am" } else { "pm" }).to_string(),
        "ww" => format!("{:02}", ts.iso_week().week()),
        "w" => ts.iso_week().week().to_string(),
        other => other.to_string(),
    }
}
