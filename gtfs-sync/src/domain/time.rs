//! Service time handling for GTFS feeds.
//!
//! GTFS gives times as "HH:MM:SS" strings measured from the start of the
//! service day, so hours run past 23 for trips that continue after
//! midnight ("25:10:00" is 01:10 the next morning). This module
//! represents those times as whole seconds into the service day.

use std::fmt;
use std::ops::Add;

/// Error returned when parsing an invalid service time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid service time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day within a transit service day, in seconds.
///
/// Unlike a wall-clock time, a service time is unbounded above: overnight
/// trips carry times beyond 24:00:00 on the same service day.
///
/// # Examples
///
/// ```
/// use gtfs_sync::domain::ServiceTime;
///
/// let t = ServiceTime::parse("08:30:00").unwrap();
/// assert_eq!(t.seconds(), 8 * 3600 + 30 * 60);
///
/// // Overnight times are valid
/// let late = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(late.to_string(), "25:10:00");
///
/// // Malformed inputs are rejected
/// assert!(ServiceTime::parse("8.30").is_err());
/// assert!(ServiceTime::parse("08:61:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Construct a service time from whole seconds into the service day.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse a time from "HH:MM:SS" format.
    ///
    /// Hours may exceed 23 and may be one or more digits; minutes and
    /// seconds must be exactly two digits in 00-59.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.split(':');

        let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(m), Some(sec)) => (h, m, sec),
            _ => return Err(TimeError::new("expected HH:MM:SS format")),
        };

        if parts.next().is_some() {
            return Err(TimeError::new("expected HH:MM:SS format"));
        }

        if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new("invalid hour digits"));
        }

        let hours: u32 = hours
            .parse()
            .map_err(|_| TimeError::new("hour out of range"))?;

        let minutes =
            parse_two_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds =
            parse_two_digits(seconds).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        let total = hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .ok_or_else(|| TimeError::new("hour out of range"))?;

        Ok(Self(total))
    }

    /// Returns the total seconds into the service day.
    pub const fn seconds(self) -> u32 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`.
    ///
    /// Returns `None` if `earlier` is after `self`.
    pub fn seconds_since(self, earlier: Self) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }
}

impl Add<u32> for ServiceTime {
    type Output = Self;

    fn add(self, seconds: u32) -> Self {
        Self(self.0 + seconds)
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

/// Parse exactly two ASCII digits.
fn parse_two_digits(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
        return None;
    }
    Some((bytes[0] - b'0') as u32 * 10 + (bytes[1] - b'0') as u32)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display then parse returns the original value.
        #[test]
        fn roundtrip(secs in 0u32..200_000) {
            let t = ServiceTime::from_seconds(secs);
            let parsed = ServiceTime::parse(&t.to_string()).unwrap();
            prop_assert_eq!(parsed, t);
        }

        /// Parsing never panics on arbitrary input.
        #[test]
        fn parse_total(s in ".*") {
            let _ = ServiceTime::parse(&s);
        }

        /// Minutes out of range are always rejected.
        #[test]
        fn bad_minutes_rejected(h in 0u32..30, m in 60u32..100, s in 0u32..60) {
            let formatted = format!("{h:02}:{m:02}:{s:02}");
            prop_assert!(ServiceTime::parse(&formatted).is_err());
        }
    }
}
