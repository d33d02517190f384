//! Wall clock keeping and time formatting

use core::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use heapless::String;

use crate::text::format_truncated;

/// Hour display style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockStyle {
    #[default]
    TwentyFourHour,
    TwelveHour,
}

impl ClockStyle {
    pub fn toggled(self) -> Self {
        match self {
            ClockStyle::TwentyFourHour => ClockStyle::TwelveHour,
            ClockStyle::TwelveHour => ClockStyle::TwentyFourHour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Current Time Service payload is shorter than 10 bytes
    ShortPayload(usize),
    /// Date or time fields out of range
    InvalidDateTime,
}

/// `HH:MM`, hours as 00-23 or 01-12 depending on `style`
pub fn format_time(time: &NaiveDateTime, style: ClockStyle) -> String<5> {
    let hour = match style {
        ClockStyle::TwentyFourHour => time.hour(),
        ClockStyle::TwelveHour => time.hour12().1,
    };
    format_truncated(format_args!("{:02}:{:02}", hour, time.minute()))
}

/// ISO 8601 calendar date, `YYYY-MM-DD`
pub fn format_date(date: &NaiveDate) -> String<10> {
    format_truncated(format_args!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    ))
}

/// Years a Current Time Service value can carry
const CTS_YEARS: core::ops::RangeInclusive<i32> = 1582..=9999;

/// Decode a Current Time Service (0x2A2B) value.
///
/// Layout: year (u16 LE), month, day, hours, minutes, seconds, day of week,
/// fractions of 1/256 s, adjust reason.
pub fn parse_current_time(bytes: &[u8]) -> Result<NaiveDateTime, Error> {
    if bytes.len() < 10 {
        return Err(Error::ShortPayload(bytes.len()));
    }
    let year = u16::from_le_bytes([bytes[0], bytes[1]]) as i32;
    // Year 0 means unknown
    if !CTS_YEARS.contains(&year) {
        return Err(Error::InvalidDateTime);
    }
    let month = bytes[2] as u32;
    let day = bytes[3] as u32;
    let hour = bytes[4] as u32;
    let min = bytes[5] as u32;
    let sec = bytes[6] as u32;
    // Convert fractions_256 to milliseconds
    let milli = bytes[8] as u32 * 1000 / 256;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_milli_opt(hour, min, sec, milli))
        .ok_or(Error::InvalidDateTime)
}

/// Shift UTC into local time
pub fn local_time(utc: NaiveDateTime, offset_secs: i32) -> NaiveDateTime {
    utc + TimeDelta::seconds(offset_secs as i64)
}

/// Time left until the next full minute, between 1 ms and 60 s
pub fn until_next_minute(time: &NaiveDateTime) -> Duration {
    let elapsed_ms = time.second() as u64 * 1000 + (time.nanosecond() / 1_000_000) as u64 % 1000;
    Duration::from_millis(60_000 - elapsed_ms.min(59_999))
}

/// Wall clock extrapolated from a reference point and the system uptime
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    /// Clock time
    reference: NaiveDateTime,
    /// Uptime at which `reference` was taken
    taken_at: Duration,
}

impl Clock {
    /// Start counting from `time` at uptime zero
    pub fn new(time: NaiveDateTime) -> Self {
        Self {
            reference: time,
            taken_at: Duration::ZERO,
        }
    }

    /// Current time at the given uptime
    pub fn now(&self, uptime: Duration) -> NaiveDateTime {
        let elapsed = uptime.saturating_sub(self.taken_at);
        self.reference + TimeDelta::microseconds(elapsed.as_micros() as i64)
    }

    /// Replace the reference with a freshly received time
    pub fn sync(&mut self, time: NaiveDateTime, uptime: Duration) {
        self.reference = time;
        self.taken_at = uptime;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn formats_24h_and_12h() {
        let time = at(15, 4, 0);
        assert_eq!(format_time(&time, ClockStyle::TwentyFourHour).as_str(), "15:04");
        assert_eq!(format_time(&time, ClockStyle::TwelveHour).as_str(), "03:04");
    }

    #[test]
    fn midnight_in_12h_is_twelve() {
        let time = at(0, 30, 0);
        assert_eq!(format_time(&time, ClockStyle::TwelveHour).as_str(), "12:30");
        assert_eq!(format_time(&time, ClockStyle::TwentyFourHour).as_str(), "00:30");
    }

    #[test]
    fn formats_iso_date() {
        let date = NaiveDate::from_ymd_opt(987, 1, 9).unwrap();
        assert_eq!(format_date(&date).as_str(), "0987-01-09");
    }

    #[test]
    fn toggles_style() {
        assert_eq!(ClockStyle::default().toggled(), ClockStyle::TwelveHour);
        assert_eq!(
            ClockStyle::TwelveHour.toggled(),
            ClockStyle::TwentyFourHour
        );
    }

    #[test]
    fn parses_current_time() {
        let bytes = [0xe8, 0x07, 3, 3, 13, 37, 42, 7, 128, 0];
        let time = parse_current_time(&bytes).unwrap();
        assert_eq!(
            time,
            NaiveDate::from_ymd_opt(2024, 3, 3)
                .unwrap()
                .and_hms_milli_opt(13, 37, 42, 500)
                .unwrap()
        );
    }

    #[test]
    fn rejects_bad_current_time() {
        assert_eq!(parse_current_time(&[0; 4]), Err(Error::ShortPayload(4)));
        let bytes = [0xe8, 0x07, 13, 3, 13, 37, 42, 7, 0, 0];
        assert_eq!(parse_current_time(&bytes), Err(Error::InvalidDateTime));
    }

    #[test]
    fn rejects_years_outside_current_time_range() {
        // year 0 is "unknown"
        let unknown = [0, 0, 1, 1, 0, 0, 0, 0, 0, 0];
        assert_eq!(parse_current_time(&unknown), Err(Error::InvalidDateTime));
        let too_late = [0x10, 0x27, 1, 1, 0, 0, 0, 0, 0, 0];
        assert_eq!(parse_current_time(&too_late), Err(Error::InvalidDateTime));
        let last = [0x0f, 0x27, 12, 31, 23, 59, 59, 0, 0, 0];
        let time = parse_current_time(&last).unwrap();
        assert_eq!(format_date(&time.date()).as_str(), "9999-12-31");
    }

    #[test]
    fn applies_offset() {
        assert_eq!(local_time(at(23, 30, 0), 3_600), at(23, 30, 0) + TimeDelta::hours(1));
        assert_eq!(local_time(at(0, 10, 0), -1_800).minute(), 40);
    }

    #[test]
    fn waits_for_minute_boundary() {
        assert_eq!(until_next_minute(&at(10, 0, 0)), Duration::from_secs(60));
        assert_eq!(until_next_minute(&at(10, 0, 45)), Duration::from_secs(15));
        let late = NaiveDate::from_ymd_opt(2024, 3, 3)
            .unwrap()
            .and_hms_milli_opt(10, 0, 59, 750)
            .unwrap();
        assert_eq!(until_next_minute(&late), Duration::from_millis(250));
    }

    #[test]
    fn clock_extrapolates_from_reference() {
        let mut clock = Clock::new(at(12, 0, 0));
        assert_eq!(clock.now(Duration::from_secs(90)), at(12, 1, 30));

        clock.sync(at(8, 0, 0), Duration::from_secs(100));
        assert_eq!(clock.now(Duration::from_secs(160)), at(8, 1, 0));
    }
}
