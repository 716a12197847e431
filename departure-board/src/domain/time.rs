//! Wall-clock times as supplied by Darwin.
//!
//! Darwin provides times as "HH:MM" strings with no date. A [`TimePoint`]
//! keeps that shape and only becomes a full date-time when it is anchored
//! against a reference instant, which is where midnight rollover is decided.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Timelike};
use std::cmp::Ordering;
use std::fmt;

/// Minutes in a day.
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day for a rail event, with no date attached.
///
/// The time is treated as falling on the same day as whatever it is anchored
/// against, unless the provider explicitly flagged it as "next day".
///
/// # Examples
///
/// ```
/// use departure_board::domain::TimePoint;
///
/// let t = TimePoint::parse_hhmm("14:30").unwrap();
/// assert_eq!(t.to_string(), "14:30");
/// assert!(!t.is_next_day());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimePoint {
    time: NaiveTime,
    next_day: bool,
}

impl TimePoint {
    /// Create a same-day time point.
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time,
            next_day: false,
        }
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::TimePoint;
    ///
    /// assert!(TimePoint::parse_hhmm("00:00").is_ok());
    /// assert!(TimePoint::parse_hhmm("23:59").is_ok());
    ///
    /// assert!(TimePoint::parse_hhmm("1430").is_err());
    /// assert!(TimePoint::parse_hhmm("14:3").is_err());
    /// assert!(TimePoint::parse_hhmm("25:00").is_err());
    /// assert!(TimePoint::parse_hhmm("On time").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| TimeError::new("invalid time"))?;

        Ok(Self::new(time))
    }

    /// Parse any time-of-day token the provider is known to send.
    ///
    /// Accepts "HH:MM" and full ISO 8601 date-times (with or without an
    /// offset), from which only the wall-clock hour and minute are kept.
    pub fn parse_provider(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        if let Ok(t) = Self::parse_hhmm(s) {
            return Ok(t);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_hour_minute(dt.time()));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::from_hour_minute(dt.time()));
        }
        Err(TimeError::new("not a time of day"))
    }

    fn from_hour_minute(time: NaiveTime) -> Self {
        // Darwin works in whole minutes
        Self::new(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }

    /// Mark this time as falling on the day after its reference day.
    pub fn with_next_day(mut self, next_day: bool) -> Self {
        self.next_day = next_day;
        self
    }

    /// Whether the provider flagged this time as next day.
    pub fn is_next_day(&self) -> bool {
        self.next_day
    }

    /// Returns the time component.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    /// Minutes since midnight, counting a flagged next-day time past 24:00.
    pub fn minutes(&self) -> i64 {
        let base = self.hour() as i64 * 60 + self.minute() as i64;
        if self.next_day {
            base + MINUTES_PER_DAY
        } else {
            base
        }
    }

    /// Anchor this time to a full date-time relative to `now`.
    ///
    /// The time is placed on `now`'s date. It moves to the following day when
    /// the provider flagged it as next day, or when it lies more than
    /// `rollover` before `now` (a service shortly after midnight seen from late
    /// evening). Anything closer than `rollover` stays on the same day and is
    /// treated as having already happened.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::TimePoint;
    /// use chrono::{Duration, NaiveDate};
    ///
    /// let now = NaiveDate::from_ymd_opt(2024, 3, 15)
    ///     .unwrap()
    ///     .and_hms_opt(23, 40, 0)
    ///     .unwrap();
    /// let rollover = Duration::hours(6);
    ///
    /// let late = TimePoint::parse_hhmm("23:55").unwrap().anchor(now, rollover);
    /// assert_eq!(late.date(), now.date());
    ///
    /// let after_midnight = TimePoint::parse_hhmm("00:10").unwrap().anchor(now, rollover);
    /// assert_eq!(after_midnight.date(), now.date().succ_opt().unwrap());
    /// ```
    pub fn anchor(&self, now: NaiveDateTime, rollover: Duration) -> NaiveDateTime {
        let candidate = now.date().and_time(self.time);
        if self.next_day || candidate < now - rollover {
            candidate + Duration::days(1)
        } else {
            candidate
        }
    }

    /// Anchor this time relative to an earlier, already anchored event.
    ///
    /// Used for estimates against their scheduled time: an estimate may be a
    /// little earlier than the reference (early running) but one that is more
    /// than `rollover` earlier has crossed midnight.
    pub fn anchor_after(&self, reference: NaiveDateTime, rollover: Duration) -> NaiveDateTime {
        let candidate = reference.date().and_time(self.time);
        if self.next_day || candidate < reference - rollover {
            candidate + Duration::days(1)
        } else {
            candidate
        }
    }

    /// Signed minutes from `earlier` to `self`, assuming they are less than
    /// `rollover` apart across midnight.
    pub fn minutes_since(&self, earlier: TimePoint, rollover: Duration) -> i64 {
        let diff = self.minutes() - earlier.minutes();
        if diff < -rollover.num_minutes() {
            diff + MINUTES_PER_DAY
        } else {
            diff
        }
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.minutes().cmp(&other.minutes())
    }
}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({:02}:{:02}", self.hour(), self.minute())?;
        if self.next_day {
            write!(f, " +1d")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn tp(s: &str) -> TimePoint {
        TimePoint::parse_hhmm(s).unwrap()
    }

    #[test]
    fn parse_valid_times() {
        let t = tp("00:00");
        assert_eq!((t.hour(), t.minute()), (0, 0));

        let t = tp("23:59");
        assert_eq!((t.hour(), t.minute()), (23, 59));
    }

    #[test]
    fn reject_bad_formats() {
        for s in ["", "1:30", "14:3", "14-30", "ab:cd", "24:00", "12:60", "Delayed"] {
            assert!(TimePoint::parse_hhmm(s).is_err(), "{s} should be rejected");
        }
    }

    #[test]
    fn provider_accepts_iso_datetimes() {
        let t = TimePoint::parse_provider("2024-03-15T10:45:00+00:00").unwrap();
        assert_eq!(t.to_string(), "10:45");

        let t = TimePoint::parse_provider("2024-03-15T10:45:31.1234567+01:00").unwrap();
        assert_eq!(t.to_string(), "10:45");

        let t = TimePoint::parse_provider("2024-03-15T07:05:00").unwrap();
        assert_eq!(t.to_string(), "07:05");

        let t = TimePoint::parse_provider(" 09:15 ").unwrap();
        assert_eq!(t.to_string(), "09:15");
    }

    #[test]
    fn provider_rejects_status_text() {
        assert!(TimePoint::parse_provider("On time").is_err());
        assert!(TimePoint::parse_provider("No report").is_err());
    }

    #[test]
    fn anchor_same_day() {
        let now = at(10, 0);
        let anchored = tp("10:30").anchor(now, Duration::hours(6));
        assert_eq!(anchored, at(10, 30));
    }

    #[test]
    fn anchor_recent_past_stays_same_day() {
        let now = at(10, 0);
        let anchored = tp("09:50").anchor(now, Duration::hours(6));
        assert_eq!(anchored, at(9, 50));
    }

    #[test]
    fn anchor_rolls_over_midnight() {
        let now = at(23, 30);
        let anchored = tp("00:15").anchor(now, Duration::hours(6));
        assert_eq!(anchored, at(0, 15) + Duration::days(1));
    }

    #[test]
    fn anchor_respects_explicit_next_day_flag() {
        let now = at(10, 0);
        let anchored = tp("11:00").with_next_day(true).anchor(now, Duration::hours(6));
        assert_eq!(anchored, at(11, 0) + Duration::days(1));
    }

    #[test]
    fn anchor_after_handles_early_running() {
        let scheduled = at(10, 0);
        let anchored = tp("09:58").anchor_after(scheduled, Duration::hours(6));
        assert_eq!(anchored, at(9, 58));
    }

    #[test]
    fn anchor_after_crosses_midnight() {
        let scheduled = at(23, 55);
        let anchored = tp("00:07").anchor_after(scheduled, Duration::hours(6));
        assert_eq!(anchored, at(0, 7) + Duration::days(1));
    }

    #[test]
    fn minutes_since_wraps_midnight() {
        assert_eq!(tp("10:15").minutes_since(tp("10:00"), Duration::hours(6)), 15);
        assert_eq!(tp("00:05").minutes_since(tp("23:58"), Duration::hours(6)), 7);
        assert_eq!(tp("09:58").minutes_since(tp("10:00"), Duration::hours(6)), -2);
    }

    #[test]
    fn ordering_puts_next_day_last() {
        assert!(tp("23:00") < tp("01:00").with_next_day(true));
        assert!(tp("01:00") < tp("23:00"));
    }

    #[test]
    fn display_and_debug() {
        let t = tp("07:05");
        assert_eq!(t.to_string(), "07:05");
        assert_eq!(format!("{:?}", t), "TimePoint(07:05)");
        assert_eq!(format!("{:?}", t.with_next_day(true)), "TimePoint(07:05 +1d)");
    }
}
