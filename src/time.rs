//! Minutes-of-day / minutes-in-two-day-window arithmetic shared by every
//! component that reasons about departure and arrival clocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// One day, in minutes.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// The two-day window decision variables (`dep_mod`, `arr_mod`) live in, to
/// allow next-day rollover from a delay pushed past midnight.
pub const MINUTES_PER_TWO_DAYS: i64 = 2 * MINUTES_PER_DAY;

/// A point in time expressed as minutes since some epoch (midnight of day 0
/// for decision-variable clocks, or minutes-of-day for curfew/capacity
/// window boundaries).
#[derive(Debug, Clone, Copy, Ord, Eq, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(pub i64);

impl Time {
    pub fn minutes_of_day(self) -> i64 {
        self.0.rem_euclid(MINUTES_PER_DAY)
    }

    /// True if `[a, b)` and `[window.0, window.1)` overlap.
    pub fn is_overlapping(span: (Time, Time), window: (Time, Time)) -> bool {
        span.0 < window.1 && span.1 > window.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0.div_euclid(MINUTES_PER_DAY);
        let remaining = self.0.rem_euclid(MINUTES_PER_DAY);
        write!(f, "DAY{} {:02}:{:02}", days + 1, remaining / 60, remaining % 60)
    }
}

impl Add<i64> for Time {
    type Output = Time;
    fn add(self, rhs: i64) -> Time {
        Time(self.0 + rhs)
    }
}

impl Sub<i64> for Time {
    type Output = Time;
    fn sub(self, rhs: i64) -> Time {
        Time(self.0 - rhs)
    }
}

impl Sub<Time> for Time {
    type Output = i64;
    fn sub(self, rhs: Time) -> i64 {
        self.0 - rhs.0
    }
}

/// Parses `"HH:MM"` into minutes-of-day. Returns `None` on anything that
/// isn't exactly that shape — callers treat a `None` as a malformed rule to
/// skip, never as a hard error.
pub fn parse_hh_mm(s: &str) -> Option<i64> {
    let (h, m) = s.split_once(':')?;
    let h: i64 = h.trim().parse().ok()?;
    let m: i64 = m.trim().parse().ok()?;
    if !(0..24).contains(&h) || !(0..60).contains(&m) {
        return None;
    }
    Some(h * 60 + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_hh_mm() {
        assert_eq!(parse_hh_mm("08:00"), Some(480));
        assert_eq!(parse_hh_mm("23:59"), Some(1439));
        assert_eq!(parse_hh_mm("00:00"), Some(0));
    }

    #[test]
    fn rejects_malformed_hh_mm() {
        assert_eq!(parse_hh_mm("8am"), None);
        assert_eq!(parse_hh_mm("24:00"), None);
        assert_eq!(parse_hh_mm("10:60"), None);
        assert_eq!(parse_hh_mm(""), None);
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(Time::is_overlapping((Time(0), Time(10)), (Time(5), Time(15))));
        assert!(!Time::is_overlapping((Time(0), Time(10)), (Time(10), Time(20))));
    }

    #[test]
    fn display_shows_day_and_clock() {
        assert_eq!(Time(0).to_string(), "DAY1 00:00");
        assert_eq!(Time(1440).to_string(), "DAY2 00:00");
        assert_eq!(Time(1500).to_string(), "DAY2 01:00");
    }
}
