//! Feed tables: immutable, validated transit data for one session.
//!
//! A [`FeedContext`] is built once per feed selection and passed by
//! reference into every operation that needs schedule data. Referential
//! integrity between tables is checked at construction, so lookups that
//! follow a validated reference cannot fail.

mod loader;

use std::collections::HashMap;

use crate::domain::{Agency, FrequencyWindow, Route, Stop, StopId, Trip};

pub use loader::load_feed;

/// Error raised while loading or validating a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A feed file could not be read.
    #[error("failed to read {name}: {source}")]
    Io {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A feed file could not be parsed as CSV.
    #[error("malformed {name}: {source}")]
    Csv {
        name: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A record held a value the domain rejects.
    #[error("{name}: {message}")]
    BadRecord { name: &'static str, message: String },

    /// A trip's stop sequence references a stop missing from the stop table.
    #[error("trip {trip} references unknown stop {stop}")]
    UnknownStop { trip: String, stop: String },

    /// A trip references a route missing from the route table.
    #[error("trip {trip} references unknown route {route}")]
    UnknownRoute { trip: String, route: String },

    /// A route references an agency missing from the agency table.
    #[error("route {route} references unknown agency {agency}")]
    UnknownAgency { route: String, agency: String },

    /// A frequency window references a trip missing from the trip table.
    #[error("frequency window references unknown trip {trip}")]
    UnknownTrip { trip: String },
}

/// Immutable transit tables for one loaded feed.
#[derive(Debug, Clone)]
pub struct FeedContext {
    agencies: HashMap<String, Agency>,
    routes: HashMap<String, Route>,
    trips: HashMap<String, Trip>,
    stops: HashMap<StopId, Stop>,
    frequencies: HashMap<String, Vec<FrequencyWindow>>,
}

impl FeedContext {
    /// Assemble a context from parsed tables, validating every
    /// cross-table reference.
    ///
    /// Any dangling reference is fatal: no partial context is returned.
    pub fn new(
        agencies: HashMap<String, Agency>,
        routes: HashMap<String, Route>,
        trips: HashMap<String, Trip>,
        stops: HashMap<StopId, Stop>,
        frequencies: HashMap<String, Vec<FrequencyWindow>>,
    ) -> Result<Self, FeedError> {
        for route in routes.values() {
            if !route.agency_id.is_empty() && !agencies.contains_key(&route.agency_id) {
                return Err(FeedError::UnknownAgency {
                    route: route.id.clone(),
                    agency: route.agency_id.clone(),
                });
            }
        }

        for trip in trips.values() {
            if !routes.contains_key(&trip.route_id) {
                return Err(FeedError::UnknownRoute {
                    trip: trip.id.clone(),
                    route: trip.route_id.clone(),
                });
            }
            for trip_stop in &trip.stops {
                if !stops.contains_key(&trip_stop.stop_id) {
                    return Err(FeedError::UnknownStop {
                        trip: trip.id.clone(),
                        stop: trip_stop.stop_id.to_string(),
                    });
                }
            }
        }

        for trip_id in frequencies.keys() {
            if !trips.contains_key(trip_id) {
                return Err(FeedError::UnknownTrip {
                    trip: trip_id.clone(),
                });
            }
        }

        Ok(Self {
            agencies,
            routes,
            trips,
            stops,
            frequencies,
        })
    }

    /// Look up a route by identifier.
    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.get(route_id)
    }

    /// Look up a trip by identifier.
    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.get(trip_id)
    }

    /// Look up a stop by identifier.
    pub fn stop(&self, stop_id: &StopId) -> Option<&Stop> {
        self.stops.get(stop_id)
    }

    /// The agency operating a route.
    ///
    /// Routes that leave the agency column blank fall back to the feed's
    /// sole agency when there is exactly one.
    pub fn agency_for(&self, route: &Route) -> Option<&Agency> {
        if !route.agency_id.is_empty() {
            return self.agencies.get(&route.agency_id);
        }
        if self.agencies.len() == 1 {
            return self.agencies.values().next();
        }
        None
    }

    /// Frequency windows for a trip, in feed order. Empty when the trip
    /// has explicit per-departure times instead.
    pub fn frequencies_for(&self, trip_id: &str) -> &[FrequencyWindow] {
        self.frequencies
            .get(trip_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The stops a trip visits, in sequence order.
    ///
    /// Construction validated every reference, so each lookup succeeds.
    pub fn ordered_stops(&self, trip: &Trip) -> Vec<&Stop> {
        trip.stops
            .iter()
            .filter_map(|ts| self.stops.get(&ts.stop_id))
            .collect()
    }

    /// Iterate all stops.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// Iterate all routes.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Iterate all trips.
    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    /// Iterate all agencies.
    pub fn agencies(&self) -> impl Iterator<Item = &Agency> {
        self.agencies.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteType, TripStop};

    fn stop(id: &str) -> Stop {
        Stop::new(StopId::parse(id).unwrap(), format!("Stop {id}"), 20.0, -103.0)
    }

    fn agency() -> Agency {
        Agency {
            id: "A1".into(),
            name: "SITEUR".into(),
        }
    }

    fn route(agency_id: &str) -> Route {
        Route {
            id: "R1".into(),
            agency_id: agency_id.into(),
            short_name: "C01".into(),
            long_name: "Circuito 01".into(),
            route_type: RouteType::Bus,
            color: None,
            text_color: None,
        }
    }

    fn trip(stop_ids: &[&str]) -> Trip {
        Trip {
            id: "T1".into(),
            route_id: "R1".into(),
            headsign: "Centro".into(),
            stops: stop_ids
                .iter()
                .enumerate()
                .map(|(i, id)| TripStop {
                    stop_id: StopId::parse(id).unwrap(),
                    sequence: i as u32 + 1,
                    offset_secs: i as u32 * 60,
                })
                .collect(),
        }
    }

    fn context(trip_stops: &[&str], table_stops: &[&str]) -> Result<FeedContext, FeedError> {
        FeedContext::new(
            [("A1".to_string(), agency())].into(),
            [("R1".to_string(), route("A1"))].into(),
            [("T1".to_string(), trip(trip_stops))].into(),
            table_stops
                .iter()
                .map(|id| (StopId::parse(id).unwrap(), stop(id)))
                .collect(),
            HashMap::new(),
        )
    }

    #[test]
    fn valid_context_builds() {
        assert!(context(&["S1", "S2"], &["S1", "S2"]).is_ok());
    }

    #[test]
    fn unknown_stop_reference_is_fatal() {
        let err = context(&["S1", "S9"], &["S1", "S2"]).unwrap_err();
        assert!(matches!(err, FeedError::UnknownStop { .. }));
        assert!(err.to_string().contains("S9"));
    }

    #[test]
    fn unknown_route_reference_is_fatal() {
        let err = FeedContext::new(
            [("A1".to_string(), agency())].into(),
            HashMap::new(),
            [("T1".to_string(), trip(&[]))].into(),
            HashMap::new(),
            HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::UnknownRoute { .. }));
    }

    #[test]
    fn unknown_frequency_trip_is_fatal() {
        let err = FeedContext::new(
            [("A1".to_string(), agency())].into(),
            [("R1".to_string(), route("A1"))].into(),
            HashMap::new(),
            HashMap::new(),
            [("ghost".to_string(), Vec::new())].into(),
        )
        .unwrap_err();
        assert!(matches!(err, FeedError::UnknownTrip { .. }));
    }

    #[test]
    fn blank_agency_falls_back_to_sole_agency() {
        let ctx = FeedContext::new(
            [("A1".to_string(), agency())].into(),
            [("R1".to_string(), route(""))].into(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        )
        .unwrap();
        let r = ctx.route("R1").unwrap();
        assert_eq!(ctx.agency_for(r).unwrap().name, "SITEUR");
    }

    #[test]
    fn ordered_stops_follow_sequence() {
        let ctx = context(&["S2", "S1"], &["S1", "S2"]).unwrap();
        let trip = ctx.trip("T1").unwrap();
        let names: Vec<&str> = ctx
            .ordered_stops(trip)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(names, ["S2", "S1"]);
    }
}
