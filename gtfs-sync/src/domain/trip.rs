//! Trip types: one scheduled run of a route over an ordered stop sequence.

use super::stop::StopId;

/// One stop visit within a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripStop {
    /// The stop visited.
    pub stop_id: StopId,

    /// Position within the trip, from the feed's stop sequence numbers.
    pub sequence: u32,

    /// Arrival offset in seconds from the trip's first stop.
    ///
    /// For frequency-based trips the absolute arrival times in the feed
    /// are templates; only the offsets between stops are meaningful.
    pub offset_secs: u32,
}

/// A single trip: a route identifier, a direction, and the ordered stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    /// Feed-unique trip identifier.
    pub id: String,

    /// Parent route identifier.
    pub route_id: String,

    /// Display direction shown to riders.
    pub headsign: String,

    /// Stop visits ordered by sequence number.
    pub stops: Vec<TripStop>,
}

impl Trip {
    /// The arrival offset for a given stop, if the trip visits it.
    ///
    /// When a trip visits a stop more than once (loop routes), the first
    /// visit's offset is returned.
    pub fn offset_for(&self, stop_id: &StopId) -> Option<u32> {
        self.stops
            .iter()
            .find(|s| &s.stop_id == stop_id)
            .map(|s| s.offset_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> Trip {
        Trip {
            id: "T1".into(),
            route_id: "R1".into(),
            headsign: "Centro".into(),
            stops: vec![
                TripStop {
                    stop_id: StopId::parse("A").unwrap(),
                    sequence: 1,
                    offset_secs: 0,
                },
                TripStop {
                    stop_id: StopId::parse("B").unwrap(),
                    sequence: 2,
                    offset_secs: 120,
                },
            ],
        }
    }

    #[test]
    fn offset_for_known_stop() {
        let t = trip();
        assert_eq!(t.offset_for(&StopId::parse("B").unwrap()), Some(120));
    }

    #[test]
    fn offset_for_unknown_stop() {
        let t = trip();
        assert_eq!(t.offset_for(&StopId::parse("Z").unwrap()), None);
    }
}
