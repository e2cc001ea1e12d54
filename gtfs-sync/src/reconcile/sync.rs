//! Reconciliation orchestration.
//!
//! Sequences, for one route+trip, a bounding-box query per stop against
//! the external node source, matches the returned candidates, and hands
//! the ordered match results to changeset assembly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::domain::StopId;
use crate::feed::FeedContext;
use crate::overpass::{BoundingBox, GeoNode, NodeQuery, OverpassError};

use super::builder::{self, ChangesetError, StopMatch};
use super::changeset::Changeset;
use super::config::ReconcileConfig;
use super::matcher::match_stop;

/// A shared flag requesting early termination.
///
/// Cancellation is honored at stop boundaries: stops whose queries were
/// already dispatched are still reconciled, later stops are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Error from a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The requested route is not in the feed.
    #[error("unknown route {0}")]
    UnknownRoute(String),

    /// The requested trip is not in the feed.
    #[error("unknown trip {0}")]
    UnknownTrip(String),

    /// The trip belongs to a different route than requested.
    #[error("trip {trip} belongs to route {actual}, not {requested}")]
    TripRouteMismatch {
        trip: String,
        requested: String,
        actual: String,
    },

    /// No agency could be resolved for the route.
    #[error("route {0} has no resolvable agency")]
    MissingAgency(String),

    /// Cancelled before any stop was reconciled.
    #[error("reconciliation cancelled before the first stop")]
    Cancelled,

    /// Changeset assembly failed.
    #[error(transparent)]
    Build(#[from] ChangesetError),
}

/// Outcome of a reconciliation run.
///
/// Beyond the changeset itself, the report carries everything a caller
/// needs to judge the run's quality: which stops fell back to creation
/// because their queries failed, and where the matcher discarded
/// qualifying candidates.
#[derive(Debug)]
pub struct ReconcileReport {
    /// The assembled changeset.
    pub changeset: Changeset,

    /// Stops considered (after any cancellation truncation).
    pub stops_total: usize,

    /// Stops matched to an existing external node.
    pub stops_matched: usize,

    /// Stops treated as unmatched because every query attempt failed.
    pub fallbacks: Vec<StopId>,

    /// Per-stop counts of qualifying candidates discarded by
    /// first-match-wins resolution.
    pub ambiguous: Vec<(StopId, usize)>,

    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
}

/// Reconciles feed trips against an external node source.
#[derive(Debug, Clone)]
pub struct Reconciler<Q> {
    query: Q,
    config: ReconcileConfig,
}

impl<Q: NodeQuery + Sync> Reconciler<Q> {
    /// Create a reconciler over a node source.
    pub fn new(query: Q, config: ReconcileConfig) -> Self {
        Self { query, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile one trip of one route.
    ///
    /// Per-stop queries run concurrently up to the configured bound;
    /// results are folded back in stop order, so relation member order
    /// always follows the trip. A stop whose query fails (all mirrors
    /// exhausted) is downgraded to unmatched and reported, not fatal.
    pub async fn reconcile_trip(
        &self,
        feed: &FeedContext,
        route_id: &str,
        trip_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReconcileReport, ReconcileError> {
        let route = feed
            .route(route_id)
            .ok_or_else(|| ReconcileError::UnknownRoute(route_id.to_string()))?;
        let trip = feed
            .trip(trip_id)
            .ok_or_else(|| ReconcileError::UnknownTrip(trip_id.to_string()))?;
        if trip.route_id != route.id {
            return Err(ReconcileError::TripRouteMismatch {
                trip: trip.id.clone(),
                requested: route.id.clone(),
                actual: trip.route_id.clone(),
            });
        }
        let agency = feed
            .agency_for(route)
            .ok_or_else(|| ReconcileError::MissingAgency(route.id.clone()))?;

        let stops = feed.ordered_stops(trip);
        info!(
            route = %route.id,
            trip = %trip.id,
            stops = stops.len(),
            "reconciling trip"
        );

        let results = self.query_stops(&stops, cancel).await;

        let mut matches = Vec::with_capacity(results.len());
        let mut fallbacks = Vec::new();
        let mut ambiguous = Vec::new();
        let mut stops_matched = 0;
        let mut cancelled = false;

        for (stop, result) in stops.iter().zip(results) {
            let candidates = match result {
                QueryResult::Skipped => {
                    cancelled = true;
                    break;
                }
                QueryResult::Failed(e) => {
                    warn!(stop = %stop.id, error = %e, "query failed, treating stop as unmatched");
                    fallbacks.push(stop.id.clone());
                    Vec::new()
                }
                QueryResult::Candidates(candidates) => candidates,
            };

            let outcome = match_stop(stop, candidates, self.config.epsilon_deg);
            if outcome.discarded > 0 {
                debug!(
                    stop = %stop.id,
                    discarded = outcome.discarded,
                    "ambiguous match resolved by first candidate"
                );
                ambiguous.push((stop.id.clone(), outcome.discarded));
            }
            if outcome.node.is_some() {
                stops_matched += 1;
            }
            matches.push(StopMatch {
                stop: (*stop).clone(),
                matched: outcome.node,
            });
        }

        if matches.is_empty() && cancelled {
            return Err(ReconcileError::Cancelled);
        }

        let changeset = builder::build(route, trip, agency, &matches, &self.config)?;

        info!(
            stops = matches.len(),
            matched = stops_matched,
            fallbacks = fallbacks.len(),
            ambiguous = ambiguous.len(),
            cancelled,
            "reconciliation complete"
        );

        Ok(ReconcileReport {
            changeset,
            stops_total: matches.len(),
            stops_matched,
            fallbacks,
            ambiguous,
            cancelled,
        })
    }

    /// Dispatch one bounding-box query per stop with bounded
    /// concurrency, preserving stop order in the collected results.
    async fn query_stops(
        &self,
        stops: &[&crate::domain::Stop],
        cancel: &CancelToken,
    ) -> Vec<QueryResult> {
        let concurrency = self.config.max_concurrent_queries.max(1);
        futures::stream::iter(stops.iter())
            .map(|stop| async move {
                if cancel.is_cancelled() {
                    return QueryResult::Skipped;
                }
                let bbox =
                    BoundingBox::around(stop.lat, stop.lon, self.config.search_radius_deg);
                match self.query.nodes_in(&bbox).await {
                    Ok(candidates) => QueryResult::Candidates(candidates),
                    Err(e) => QueryResult::Failed(e),
                }
            })
            .buffered(concurrency)
            .collect()
            .await
    }
}

enum QueryResult {
    /// Not dispatched: cancellation was already requested.
    Skipped,
    Failed(OverpassError),
    Candidates(Vec<GeoNode>),
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
