//! GTFS directory loading.
//!
//! Reads the comma-separated tables of a GTFS feed directory
//! (`agency.txt`, `routes.txt`, `trips.txt`, `stops.txt`,
//! `stop_times.txt`, and optionally `frequencies.txt`) into a validated
//! [`FeedContext`]. Parsing is strict: a malformed record anywhere in a
//! table fails the whole load.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{
    Agency, FrequencyWindow, Route, RouteType, ServiceTime, Stop, StopId, Trip, TripStop,
};

use super::{FeedContext, FeedError};

#[derive(Debug, Deserialize)]
struct AgencyRecord {
    #[serde(default)]
    agency_id: String,
    agency_name: String,
}

#[derive(Debug, Deserialize)]
struct RouteRecord {
    route_id: String,
    #[serde(default)]
    agency_id: String,
    #[serde(default)]
    route_short_name: String,
    #[serde(default)]
    route_long_name: String,
    route_type: u16,
    #[serde(default)]
    route_color: Option<String>,
    #[serde(default)]
    route_text_color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripRecord {
    trip_id: String,
    route_id: String,
    #[serde(default)]
    trip_headsign: String,
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    stop_id: String,
    stop_name: String,
    stop_lat: f64,
    stop_lon: f64,
}

#[derive(Debug, Deserialize)]
struct StopTimeRecord {
    trip_id: String,
    arrival_time: String,
    stop_id: String,
    stop_sequence: u32,
}

#[derive(Debug, Deserialize)]
struct FrequencyRecord {
    trip_id: String,
    start_time: String,
    end_time: String,
    headway_secs: u32,
}

/// Load and validate a GTFS feed directory.
pub fn load_feed(dir: impl AsRef<Path>) -> Result<FeedContext, FeedError> {
    let dir = dir.as_ref();

    let agencies: Vec<AgencyRecord> = read_table(dir, "agency.txt")?;
    let routes: Vec<RouteRecord> = read_table(dir, "routes.txt")?;
    let trips: Vec<TripRecord> = read_table(dir, "trips.txt")?;
    let stops: Vec<StopRecord> = read_table(dir, "stops.txt")?;
    let stop_times: Vec<StopTimeRecord> = read_table(dir, "stop_times.txt")?;
    let frequencies: Vec<FrequencyRecord> = read_optional_table(dir, "frequencies.txt")?;

    debug!(
        agencies = agencies.len(),
        routes = routes.len(),
        trips = trips.len(),
        stops = stops.len(),
        stop_times = stop_times.len(),
        frequencies = frequencies.len(),
        "feed tables read"
    );

    let agencies: HashMap<String, Agency> = agencies
        .into_iter()
        .map(|r| {
            (
                r.agency_id.clone(),
                Agency {
                    id: r.agency_id,
                    name: r.agency_name,
                },
            )
        })
        .collect();

    let routes: HashMap<String, Route> = routes
        .into_iter()
        .map(|r| {
            (
                r.route_id.clone(),
                Route {
                    id: r.route_id,
                    agency_id: r.agency_id,
                    short_name: r.route_short_name,
                    long_name: r.route_long_name,
                    route_type: RouteType::from_code(r.route_type),
                    color: r.route_color.filter(|c| !c.is_empty()),
                    text_color: r.route_text_color.filter(|c| !c.is_empty()),
                },
            )
        })
        .collect();

    let stop_table = build_stops(stops)?;
    let trip_table = build_trips(trips, stop_times)?;
    let frequency_table = build_frequencies(frequencies)?;

    FeedContext::new(agencies, routes, trip_table, stop_table, frequency_table)
}

fn build_stops(records: Vec<StopRecord>) -> Result<HashMap<StopId, Stop>, FeedError> {
    let mut stops = HashMap::with_capacity(records.len());
    for record in records {
        let id = StopId::parse(&record.stop_id).map_err(|e| FeedError::BadRecord {
            name: "stops.txt",
            message: e.to_string(),
        })?;
        stops.insert(
            id.clone(),
            Stop::new(id, record.stop_name, record.stop_lat, record.stop_lon),
        );
    }
    Ok(stops)
}

fn build_trips(
    trips: Vec<TripRecord>,
    stop_times: Vec<StopTimeRecord>,
) -> Result<HashMap<String, Trip>, FeedError> {
    // Group stop visits by trip, then order each group by sequence number.
    let mut by_trip: HashMap<String, Vec<StopTimeRecord>> = HashMap::new();
    for st in stop_times {
        by_trip.entry(st.trip_id.clone()).or_default().push(st);
    }

    let mut table = HashMap::with_capacity(trips.len());
    for trip in trips {
        let mut visits = by_trip.remove(&trip.trip_id).unwrap_or_default();
        visits.sort_by_key(|v| v.stop_sequence);

        let mut stops = Vec::with_capacity(visits.len());
        let mut first_arrival = None;
        for visit in visits {
            let arrival =
                ServiceTime::parse(&visit.arrival_time).map_err(|e| FeedError::BadRecord {
                    name: "stop_times.txt",
                    message: format!("trip {}: {e}", trip.trip_id),
                })?;
            let first = *first_arrival.get_or_insert(arrival);
            let offset_secs =
                arrival
                    .seconds_since(first)
                    .ok_or_else(|| FeedError::BadRecord {
                        name: "stop_times.txt",
                        message: format!(
                            "trip {}: arrival {arrival} precedes trip start {first}",
                            trip.trip_id
                        ),
                    })?;
            let stop_id = StopId::parse(&visit.stop_id).map_err(|e| FeedError::BadRecord {
                name: "stop_times.txt",
                message: format!("trip {}: {e}", trip.trip_id),
            })?;
            stops.push(TripStop {
                stop_id,
                sequence: visit.stop_sequence,
                offset_secs,
            });
        }

        table.insert(
            trip.trip_id.clone(),
            Trip {
                id: trip.trip_id,
                route_id: trip.route_id,
                headsign: trip.trip_headsign,
                stops,
            },
        );
    }
    Ok(table)
}

fn build_frequencies(
    records: Vec<FrequencyRecord>,
) -> Result<HashMap<String, Vec<FrequencyWindow>>, FeedError> {
    let mut table: HashMap<String, Vec<FrequencyWindow>> = HashMap::new();
    for record in records {
        let parse = |field: &str, value: &str| {
            ServiceTime::parse(value).map_err(|e| FeedError::BadRecord {
                name: "frequencies.txt",
                message: format!("trip {} {field}: {e}", record.trip_id),
            })
        };
        let window = FrequencyWindow {
            start: parse("start_time", &record.start_time)?,
            end: parse("end_time", &record.end_time)?,
            headway_secs: record.headway_secs,
        };
        table.entry(record.trip_id).or_default().push(window);
    }
    Ok(table)
}

fn read_table<T: DeserializeOwned>(dir: &Path, name: &'static str) -> Result<Vec<T>, FeedError> {
    let file = File::open(dir.join(name)).map_err(|source| FeedError::Io { name, source })?;
    parse_table(file, name)
}

/// Like [`read_table`] but a missing file yields an empty table.
fn read_optional_table<T: DeserializeOwned>(
    dir: &Path,
    name: &'static str,
) -> Result<Vec<T>, FeedError> {
    match File::open(dir.join(name)) {
        Ok(file) => parse_table(file, name),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(FeedError::Io { name, source }),
    }
}

fn parse_table<T: DeserializeOwned>(file: File, name: &'static str) -> Result<Vec<T>, FeedError> {
    let mut reader = csv::Reader::from_reader(file);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| FeedError::Csv { name, source })
}
