//! Software civil clock
//!
//! The device has no RTC. Civil time starts at a fixed epoch, can be set by
//! command, and advances by consuming whole seconds of elapsed uptime. Any
//! sub-second remainder is carried into the next update so no time is lost.

use alloc::string::{String, ToString};
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CommandError;
use crate::types::Timestamp;

/// Length of `YYYY-MM-DD HH:MM:SS`
pub const TIMESTAMP_LEN: usize = 19;

pub const MIN_YEAR: u16 = 2020;
pub const MAX_YEAR: u16 = 2050;

pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

// ----------------------------------------------------------------------------
// Civil Time
// ----------------------------------------------------------------------------

/// Broken-down calendar time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for CivilTime {
    /// Epoch the firmware boots with until a time is set
    fn default() -> Self {
        Self {
            year: 2024,
            month: 8,
            day: 30,
            hour: 12,
            minute: 0,
            second: 0,
        }
    }
}

impl CivilTime {
    /// Parse `YYYY-MM-DD HH:MM:SS`
    ///
    /// Anything that is not exactly that shape is a format error. Fields are
    /// then range checked; the day is only checked against 1..=31, not the
    /// length of the given month.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let bytes = text.as_bytes();
        if bytes.len() != TIMESTAMP_LEN {
            return Err(CommandError::InvalidTimeFormat);
        }
        let separators = [(4, b'-'), (7, b'-'), (10, b' '), (13, b':'), (16, b':')];
        if separators.iter().any(|&(at, sep)| bytes[at] != sep) {
            return Err(CommandError::InvalidTimeFormat);
        }

        let year = field(bytes, 0, 4)?;
        let month = field(bytes, 5, 7)?;
        let day = field(bytes, 8, 10)?;
        let hour = field(bytes, 11, 13)?;
        let minute = field(bytes, 14, 16)?;
        let second = field(bytes, 17, 19)?;

        let valid = (u32::from(MIN_YEAR)..=u32::from(MAX_YEAR)).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59
            && second <= 59;
        if !valid {
            return Err(CommandError::InvalidTimeValues);
        }

        // All fields fit their types after the range checks above
        Ok(Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    /// Move forward by `seconds`, normalising every field
    pub fn advance_seconds(&mut self, seconds: u64) {
        if seconds == 0 {
            return;
        }

        let total = u64::from(self.second) + seconds;
        self.second = (total % 60) as u8;
        let total = u64::from(self.minute) + total / 60;
        self.minute = (total % 60) as u8;
        let total = u64::from(self.hour) + total / 60;
        self.hour = (total % 24) as u8;
        self.advance_days(total / 24);
    }

    fn advance_days(&mut self, mut days: u64) {
        while days > 0 {
            let left_in_month = u64::from(days_in_month(self.year, self.month).saturating_sub(self.day));
            if days <= left_in_month {
                self.day += days as u8;
                return;
            }
            days -= left_in_month + 1;
            self.day = 1;
            self.month += 1;
            if self.month > 12 {
                self.month = 1;
                self.year = self.year.saturating_add(1);
            }
        }
    }
}

fn field(bytes: &[u8], start: usize, end: usize) -> Result<u32, CommandError> {
    bytes[start..end].iter().try_fold(0u32, |acc, byte| {
        if byte.is_ascii_digit() {
            Ok(acc * 10 + u32::from(byte - b'0'))
        } else {
            Err(CommandError::InvalidTimeFormat)
        }
    })
}

impl fmt::Display for CivilTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl core::str::FromStr for CivilTime {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ----------------------------------------------------------------------------
// Clock
// ----------------------------------------------------------------------------

/// Civil time driven by the uptime counter
#[derive(Debug, Clone)]
pub struct Clock {
    civil: CivilTime,
    last_update: Timestamp,
}

impl Clock {
    /// Clock at the default epoch, anchored at `now`
    pub fn new(now: Timestamp) -> Self {
        Self {
            civil: CivilTime::default(),
            last_update: now,
        }
    }

    /// Consume whole elapsed seconds since the last update
    ///
    /// Calls with less than a second elapsed leave the state untouched.
    pub fn update(&mut self, now: Timestamp) {
        let elapsed = now.elapsed_since(self.last_update);
        if elapsed < 1000 {
            return;
        }
        self.last_update = Timestamp::new(now.as_millis() - elapsed % 1000);
        self.civil.advance_seconds(elapsed / 1000);
    }

    /// Replace the civil time and re-anchor at `now`
    pub fn set(&mut self, civil: CivilTime, now: Timestamp) {
        self.civil = civil;
        self.last_update = now;
    }

    /// Civil time as of `now`
    pub fn now(&mut self, now: Timestamp) -> CivilTime {
        self.update(now);
        self.civil
    }

    /// Formatted civil time as of `now`
    pub fn timestamp(&mut self, now: Timestamp) -> String {
        self.now(now).to_string()
    }

    /// Civil time as of the last update, without advancing
    pub fn civil(&self) -> CivilTime {
        self.civil
    }

    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn civil(text: &str) -> CivilTime {
        CivilTime::parse(text).unwrap()
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2000));
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 9), 30);
    }

    #[test]
    fn test_parse_and_display() {
        let time = civil("2024-08-30 15:30:00");
        assert_eq!(time.hour, 15);
        assert_eq!(time.to_string(), "2024-08-30 15:30:00");
        assert_eq!(CivilTime::default().to_string(), "2024-08-30 12:00:00");
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        for text in ["2024-08-30 15:30", "2024/08/30 15:30:00", "2024-08-3x 15:30:00", ""] {
            assert_eq!(CivilTime::parse(text), Err(CommandError::InvalidTimeFormat), "{text}");
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        for text in [
            "2024-13-40 99:99:99",
            "2019-01-01 00:00:00",
            "2051-01-01 00:00:00",
            "2024-00-10 00:00:00",
            "2024-01-01 24:00:00",
        ] {
            assert_eq!(CivilTime::parse(text), Err(CommandError::InvalidTimeValues), "{text}");
        }
    }

    #[test]
    fn test_day_is_not_checked_against_month() {
        assert!(CivilTime::parse("2023-02-31 00:00:00").is_ok());
    }

    #[test]
    fn test_advance_carries_through_new_year() {
        let mut time = civil("2023-12-31 23:59:59");
        time.advance_seconds(1);
        assert_eq!(time.to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_advance_across_leap_day() {
        let mut time = civil("2024-02-28 12:00:00");
        time.advance_seconds(24 * 3600);
        assert_eq!(time.to_string(), "2024-02-29 12:00:00");
        time.advance_seconds(24 * 3600);
        assert_eq!(time.to_string(), "2024-03-01 12:00:00");
    }

    #[test]
    fn test_advance_many_days() {
        let mut time = civil("2024-01-01 00:00:00");
        time.advance_seconds(366 * 24 * 3600);
        assert_eq!(time.to_string(), "2025-01-01 00:00:00");
    }

    #[test]
    fn test_lenient_day_rolls_into_next_month() {
        let mut time = civil("2023-02-31 23:59:59");
        time.advance_seconds(1);
        assert_eq!(time.to_string(), "2023-03-01 00:00:00");
    }

    #[test]
    fn test_clock_carries_subsecond_remainder() {
        let mut clock = Clock::new(Timestamp::ZERO);
        clock.update(Timestamp::new(1500));
        assert_eq!(clock.civil().second, 1);
        assert_eq!(clock.last_update(), Timestamp::new(1000));

        clock.update(Timestamp::new(2000));
        assert_eq!(clock.civil().second, 2);
    }

    #[test]
    fn test_clock_update_below_one_second_is_noop() {
        let mut clock = Clock::new(Timestamp::new(500));
        let before = clock.clone();
        clock.update(Timestamp::new(1499));
        clock.update(Timestamp::new(1499));
        assert_eq!(clock.civil(), before.civil());
        assert_eq!(clock.last_update(), before.last_update());
    }

    #[test]
    fn test_set_reanchors() {
        let mut clock = Clock::new(Timestamp::ZERO);
        clock.set(civil("2024-08-30 15:30:00"), Timestamp::new(10_700));
        assert_eq!(clock.timestamp(Timestamp::new(11_000)), "2024-08-30 15:30:00");
        assert_eq!(clock.timestamp(Timestamp::new(12_700)), "2024-08-30 15:30:02");
    }
}
