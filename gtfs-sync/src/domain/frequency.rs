//! Frequency windows: interval-based service definitions.

use super::time::ServiceTime;

/// A window of repeating service for one trip.
///
/// Instead of listing every departure, the feed states that the trip
/// repeats every `headway_secs` seconds between `start` and `end`. A trip
/// may carry several non-overlapping windows (peak and off-peak service).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyWindow {
    /// First departure of the window.
    pub start: ServiceTime,

    /// End of the window; no departure at or after this time.
    pub end: ServiceTime,

    /// Seconds between consecutive departures.
    pub headway_secs: u32,
}

impl FrequencyWindow {
    /// Window length in seconds, or `None` when end precedes start.
    pub fn duration_secs(&self) -> Option<u32> {
        self.end.seconds_since(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration() {
        let window = FrequencyWindow {
            start: ServiceTime::from_seconds(3600),
            end: ServiceTime::from_seconds(7200),
            headway_secs: 600,
        };
        assert_eq!(window.duration_secs(), Some(3600));
    }

    #[test]
    fn inverted_window_has_no_duration() {
        let window = FrequencyWindow {
            start: ServiceTime::from_seconds(7200),
            end: ServiceTime::from_seconds(3600),
            headway_secs: 600,
        };
        assert_eq!(window.duration_secs(), None);
    }
}
