//! Command-line commands and their typed results.
//!
//! Each subcommand maps to one run function returning its own summary
//! type; nothing in the core modules knows the CLI exists.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;

use gtfs_sync::domain::{ServiceTime, StopId};
use gtfs_sync::feed::{self, FeedContext, FeedError};
use gtfs_sync::overpass::{OverpassClient, OverpassConfig, OverpassError};
use gtfs_sync::reconcile::{CancelToken, ReconcileConfig, ReconcileError, Reconciler};
use gtfs_sync::timetable;

/// Reconcile GTFS feeds against OpenStreetMap and expand frequency timetables.
#[derive(Debug, Parser)]
#[command(name = "gtfs-sync", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile one trip's stops against OSM and emit a changeset document
    Reconcile(ReconcileArgs),

    /// Expand a trip's frequency windows into arrival times at one stop
    Timetable(TimetableArgs),

    /// Print one feed table as key-sorted JSON
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// GTFS feed directory
    #[arg(long)]
    pub feed: PathBuf,

    /// Route identifier within the feed
    #[arg(long)]
    pub route: String,

    /// Trip identifier within the route
    #[arg(long)]
    pub trip: String,

    /// Write the changeset document here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Coordinate comparison tolerance in degrees
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Per-stop query box half-width in degrees
    #[arg(long)]
    pub radius: Option<f64>,

    /// Overpass mirror endpoints, tried in order (repeatable)
    #[arg(long)]
    pub mirror: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TimetableArgs {
    /// GTFS feed directory
    #[arg(long)]
    pub feed: PathBuf,

    /// Trip identifier within the feed
    #[arg(long)]
    pub trip: String,

    /// Stop to print arrivals for; defaults to the trip's first stop
    #[arg(long)]
    pub stop: Option<String>,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// GTFS feed directory
    #[arg(long)]
    pub feed: PathBuf,

    /// Which table to print
    #[arg(value_enum)]
    pub table: DumpTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpTable {
    Agencies,
    Routes,
    Stops,
    Trips,
}

/// Error from running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Client(#[from] OverpassError),

    #[error("unknown trip {0}")]
    UnknownTrip(String),

    #[error("trip {trip} does not visit stop {stop}")]
    StopNotOnTrip { trip: String, stop: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a finished command hands back for presentation.
#[derive(Debug)]
pub enum CommandOutcome {
    Reconcile(ReconcileSummary),
    Timetable(TimetableSummary),
    Dump(DumpSummary),
}

/// Counts and observability data from a reconcile run. The changeset
/// document itself has already been written to its destination.
#[derive(Debug)]
pub struct ReconcileSummary {
    pub stops_total: usize,
    pub created: usize,
    pub modified: usize,
    pub fallbacks: Vec<String>,
    pub ambiguous: Vec<(String, usize)>,
    pub cancelled: bool,
    pub written_to: Option<PathBuf>,
}

#[derive(Debug)]
pub struct TimetableSummary {
    pub trip: String,
    pub stop: String,
    pub times: Vec<ServiceTime>,
    pub skipped_windows: Vec<String>,
}

#[derive(Debug)]
pub struct DumpSummary {
    pub json: String,
}

/// Dispatch one parsed command.
pub async fn run(command: Command) -> Result<CommandOutcome, CommandError> {
    match command {
        Command::Reconcile(args) => run_reconcile(args).await.map(CommandOutcome::Reconcile),
        Command::Timetable(args) => run_timetable(args).map(CommandOutcome::Timetable),
        Command::Dump(args) => run_dump(args).map(CommandOutcome::Dump),
    }
}

async fn run_reconcile(args: ReconcileArgs) -> Result<ReconcileSummary, CommandError> {
    let feed = feed::load_feed(&args.feed)?;

    let mut config = ReconcileConfig::new();
    if let Some(epsilon) = args.epsilon {
        config = config.with_epsilon(epsilon);
    }
    if let Some(radius) = args.radius {
        config = config.with_search_radius(radius);
    }

    let mut client_config = OverpassConfig::new();
    if !args.mirror.is_empty() {
        client_config = client_config.with_mirrors(args.mirror.clone());
    }
    let client = OverpassClient::new(client_config)?;

    // An interrupt stops dispatching new stop queries; stops already in
    // flight still land in the (truncated) changeset.
    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing stops already dispatched");
            interrupt.cancel();
        }
    });

    let reconciler = Reconciler::new(client, config);
    let report = reconciler
        .reconcile_trip(&feed, &args.route, &args.trip, &cancel)
        .await?;

    let document = serde_json::to_string_pretty(&report.changeset)
        .expect("changeset serialization is infallible");
    match &args.out {
        Some(path) => {
            std::fs::write(path, document).map_err(|source| CommandError::Write {
                path: path.clone(),
                source,
            })?;
        }
        None => println!("{document}"),
    }

    Ok(ReconcileSummary {
        stops_total: report.stops_total,
        created: report.changeset.create.len(),
        modified: report.changeset.modify.len(),
        fallbacks: report.fallbacks.iter().map(|s| s.to_string()).collect(),
        ambiguous: report
            .ambiguous
            .iter()
            .map(|(s, n)| (s.to_string(), *n))
            .collect(),
        cancelled: report.cancelled,
        written_to: args.out,
    })
}

fn run_timetable(args: TimetableArgs) -> Result<TimetableSummary, CommandError> {
    let feed = feed::load_feed(&args.feed)?;
    let trip = feed
        .trip(&args.trip)
        .ok_or_else(|| CommandError::UnknownTrip(args.trip.clone()))?;

    let (stop_name, offset) = match &args.stop {
        Some(raw) => {
            let stop_id = StopId::parse(raw).map_err(|_| CommandError::StopNotOnTrip {
                trip: trip.id.clone(),
                stop: raw.clone(),
            })?;
            let offset = trip
                .offset_for(&stop_id)
                .ok_or_else(|| CommandError::StopNotOnTrip {
                    trip: trip.id.clone(),
                    stop: raw.clone(),
                })?;
            (raw.clone(), offset)
        }
        None => {
            let first = trip.stops.first().map(|s| s.stop_id.to_string());
            (first.unwrap_or_else(|| "(no stops)".to_string()), 0)
        }
    };

    let (times, errors) = timetable::expand_trip(offset, feed.frequencies_for(&trip.id));

    Ok(TimetableSummary {
        trip: trip.id.clone(),
        stop: stop_name,
        times,
        skipped_windows: errors.iter().map(|e| e.to_string()).collect(),
    })
}

fn run_dump(args: DumpArgs) -> Result<DumpSummary, CommandError> {
    let feed = feed::load_feed(&args.feed)?;
    let table = dump_table(&feed, args.table);
    let json = serde_json::to_string_pretty(&table).expect("JSON tables are serializable");
    Ok(DumpSummary { json })
}

/// Render one table as a key-sorted JSON object.
fn dump_table(feed: &FeedContext, table: DumpTable) -> BTreeMap<String, serde_json::Value> {
    use serde_json::json;

    match table {
        DumpTable::Agencies => feed
            .agencies()
            .map(|a| (a.id.clone(), json!({ "name": a.name })))
            .collect(),
        DumpTable::Routes => feed
            .routes()
            .map(|r| {
                (
                    r.id.clone(),
                    json!({
                        "agency_id": r.agency_id,
                        "short_name": r.short_name,
                        "long_name": r.long_name,
                        "route_type": r.route_type.code(),
                        "color": r.color,
                    }),
                )
            })
            .collect(),
        DumpTable::Stops => feed
            .stops()
            .map(|s| {
                (
                    s.id.to_string(),
                    json!({ "name": s.name, "lat": s.lat, "lon": s.lon }),
                )
            })
            .collect(),
        DumpTable::Trips => feed
            .trips()
            .map(|t| {
                (
                    t.id.clone(),
                    json!({
                        "route_id": t.route_id,
                        "headsign": t.headsign,
                        "stops": t.stops.iter().map(|ts| ts.stop_id.to_string()).collect::<Vec<_>>(),
                    }),
                )
            })
            .collect(),
    }
}
