//! Timetable expansion from frequency windows.
//!
//! Frequency-based feeds publish a start/end window and a headway
//! instead of explicit departure times. Rider-facing arrival times at a
//! given stop are derived arithmetically: one arrival per headway step,
//! shifted by the stop's offset into the trip.

use tracing::warn;

use crate::domain::{FrequencyWindow, ServiceTime};

/// Error from expanding one frequency window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimetableError {
    /// The window's headway is zero (or would be negative upstream).
    #[error("window starting {start} has a non-positive headway")]
    ZeroHeadway { start: ServiceTime },

    /// The window ends before it starts.
    #[error("window ends {end} before it starts {start}")]
    InvertedWindow { start: ServiceTime, end: ServiceTime },
}

/// Expand one frequency window into arrival times at one stop.
///
/// The departure count is `(end - start) / headway`, truncated: a final
/// partial interval yields no departure. A window of 06:00–10:00 with a
/// 600-second headway produces arrivals for departures at 06:00, 06:10,
/// and so on through 09:50; the 10:00 boundary itself is excluded. Each
/// emitted time is the departure plus `stop_offset_secs`, the stop's
/// distance into the trip.
///
/// # Examples
///
/// ```
/// use gtfs_sync::domain::{FrequencyWindow, ServiceTime};
/// use gtfs_sync::timetable::expand_window;
///
/// let window = FrequencyWindow {
///     start: ServiceTime::from_seconds(0),
///     end: ServiceTime::from_seconds(3600),
///     headway_secs: 600,
/// };
/// let times = expand_window(0, &window).unwrap();
/// let secs: Vec<u32> = times.iter().map(|t| t.seconds()).collect();
/// assert_eq!(secs, [0, 600, 1200, 1800, 2400, 3000]);
/// ```
pub fn expand_window(
    stop_offset_secs: u32,
    window: &FrequencyWindow,
) -> Result<Vec<ServiceTime>, TimetableError> {
    if window.headway_secs == 0 {
        return Err(TimetableError::ZeroHeadway {
            start: window.start,
        });
    }
    let duration = window
        .duration_secs()
        .ok_or(TimetableError::InvertedWindow {
            start: window.start,
            end: window.end,
        })?;

    let count = duration / window.headway_secs;
    Ok((0..count)
        .map(|i| window.start + stop_offset_secs + window.headway_secs * i)
        .collect())
}

/// Expand all of a trip's windows for one stop.
///
/// Windows are expanded independently and concatenated in feed order;
/// no sorting or deduplication happens across windows. A window that
/// fails validation is reported alongside the successful output and
/// does not stop its siblings from expanding.
pub fn expand_trip(
    stop_offset_secs: u32,
    windows: &[FrequencyWindow],
) -> (Vec<ServiceTime>, Vec<TimetableError>) {
    let mut times = Vec::new();
    let mut errors = Vec::new();
    for window in windows {
        match expand_window(stop_offset_secs, window) {
            Ok(expanded) => times.extend(expanded),
            Err(e) => {
                warn!(error = %e, "skipping invalid frequency window");
                errors.push(e);
            }
        }
    }
    (times, errors)
}
