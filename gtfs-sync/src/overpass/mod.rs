//! Overpass (OSM geospatial query) client.
//!
//! This module provides the external query capability the reconciliation
//! core consumes: given a bounding box, return the nodes inside it with
//! their tags and provenance.
//!
//! Key characteristics of Overpass:
//! - Public mirrors are interchangeable; a query failing on one mirror
//!   is retried on the next before the failure surfaces
//! - `out meta` responses carry edit provenance (user, version,
//!   timestamp, changeset) alongside each node's tags
//! - Coordinates are served at more precision than the 6 decimals the
//!   feed side uses, so they are re-rounded at the decode boundary

mod client;
mod error;
mod mock;
mod types;

pub use client::{DEFAULT_MIRRORS, OverpassClient, OverpassConfig};
pub use error::OverpassError;
pub use mock::StaticNodes;
pub use types::{BoundingBox, GeoNode, NodeMeta, OverpassResponse, RawElement};

/// A source of external nodes by bounding box.
///
/// Abstracts the live client so the reconciliation orchestrator can be
/// driven by [`StaticNodes`] in tests.
pub trait NodeQuery {
    /// All nodes inside `bbox`, with tags and provenance.
    fn nodes_in(
        &self,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<Vec<GeoNode>, OverpassError>> + Send;
}
