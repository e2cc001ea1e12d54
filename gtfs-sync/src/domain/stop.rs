//! Transit stop types.

use std::fmt;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// A stop identifier, unique within one feed.
///
/// Feeds use free-form identifiers ("S012", "6523"), so the only
/// structural requirement is that the id is non-empty and carries no
/// surrounding whitespace.
///
/// # Examples
///
/// ```
/// use gtfs_sync::domain::StopId;
///
/// let id = StopId::parse("S012").unwrap();
/// assert_eq!(id.as_str(), "S012");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse(" S012").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop identifier from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        if s.is_empty() {
            return Err(InvalidStopId {
                reason: "must be non-empty",
            });
        }
        if s.trim() != s {
            return Err(InvalidStopId {
                reason: "must not have surrounding whitespace",
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Round a coordinate to 6 decimal places, roughly 0.1m of precision.
///
/// All coordinates in the system pass through this on the way in, so
/// downstream comparisons work on a common grid.
pub fn round_coord(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// A transit stop with its feed identity and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Feed-unique identifier.
    pub id: StopId,

    /// Rider-facing display name.
    pub name: String,

    /// Latitude in decimal degrees, rounded to 6 decimal places.
    pub lat: f64,

    /// Longitude in decimal degrees, rounded to 6 decimal places.
    pub lon: f64,
}

impl Stop {
    /// Create a stop, rounding its coordinates to the common grid.
    pub fn new(id: StopId, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id,
            name: name.into(),
            lat: round_coord(lat),
            lon: round_coord(lon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(StopId::parse("S012").is_ok());
        assert!(StopId::parse("6523").is_ok());
        assert!(StopId::parse("stop-with-dashes").is_ok());
    }

    #[test]
    fn reject_empty() {
        assert!(StopId::parse("").is_err());
    }

    #[test]
    fn reject_surrounding_whitespace() {
        assert!(StopId::parse(" S012").is_err());
        assert!(StopId::parse("S012 ").is_err());
        assert!(StopId::parse("\tS012").is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = StopId::parse("S012").unwrap();
        assert_eq!(format!("{id}"), "S012");
        assert_eq!(format!("{id:?}"), "StopId(S012)");
    }

    #[test]
    fn rounding_to_six_decimals() {
        assert_eq!(round_coord(20.676_543_21), 20.676_543);
        assert_eq!(round_coord(-103.347_889_99), -103.347_890);
        assert_eq!(round_coord(0.0), 0.0);
    }

    #[test]
    fn stop_construction_rounds() {
        let stop = Stop::new(
            StopId::parse("S1").unwrap(),
            "Centro",
            20.676_543_21,
            -103.347_889_99,
        );
        assert_eq!(stop.lat, 20.676_543);
        assert_eq!(stop.lon, -103.347_890);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Rounding is idempotent.
        #[test]
        fn rounding_idempotent(v in -180.0f64..180.0) {
            let once = round_coord(v);
            prop_assert_eq!(once, round_coord(once));
        }

        /// Rounding moves a coordinate by at most half a grid step.
        #[test]
        fn rounding_error_bounded(v in -180.0f64..180.0) {
            prop_assert!((round_coord(v) - v).abs() <= 5e-7 + 1e-12);
        }
    }
}
