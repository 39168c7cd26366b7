//! Wall-clock and calendar boundary types.
//!
//! All scheduling arithmetic is done on integer minutes since midnight.
//! `HH:MM` and `YYYY-MM-DD` text only exist at the public boundary, and this
//! module is the single place that converts between the two.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Minutes in one calendar day. Day windows never extend past this.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time of day, stored as minutes since midnight in `0..1440`.
///
/// Serialized as zero-padded 24-hour `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build from minutes since midnight; `None` when out of range.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 60
    }

    pub fn minute(self) -> u32 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClock(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Render minutes since midnight as `HH:MM`.
///
/// Accepts `1440` so that the exclusive end of a full-day window renders as
/// `24:00`.
pub fn minutes_to_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parse the exclusive end of a day window. Unlike [`ClockTime`], `24:00`
/// is accepted and maps to [`MINUTES_PER_DAY`].
pub fn parse_window_end(s: &str) -> Result<u32, ValidationError> {
    if s.trim() == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    s.parse::<ClockTime>().map(ClockTime::minutes)
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zero_padded_and_short_hours() {
        assert_eq!("09:05".parse::<ClockTime>().unwrap().minutes(), 545);
        assert_eq!("9:05".parse::<ClockTime>().unwrap().minutes(), 545);
        assert_eq!("00:00".parse::<ClockTime>().unwrap(), ClockTime::MIDNIGHT);
        assert_eq!("23:59".parse::<ClockTime>().unwrap().minutes(), 1439);
    }

    #[test]
    fn rejects_malformed_clock_text() {
        for bad in ["24:00", "12:60", "1200", "12:5", "ab:cd", "", "-1:00", "123:00"] {
            assert!(bad.parse::<ClockTime>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn displays_zero_padded() {
        assert_eq!(ClockTime::from_hm(7, 3).unwrap().to_string(), "07:03");
        assert_eq!(minutes_to_clock(610), "10:10");
        assert_eq!(minutes_to_clock(MINUTES_PER_DAY), "24:00");
    }

    #[test]
    fn window_end_accepts_end_of_day() {
        assert_eq!(parse_window_end("24:00").unwrap(), 1440);
        assert_eq!(parse_window_end("18:00").unwrap(), 1080);
        assert!(parse_window_end("24:01").is_err());
    }

    #[test]
    fn serde_uses_clock_text() {
        let t = ClockTime::from_hm(13, 30).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"13:30\"");
        let back: ClockTime = serde_json::from_str("\"13:30\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn dates_round_trip_through_text() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(d), "2024-02-29");
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("03/04/2024").is_err());
    }
}
