//! Changeset assembly.
//!
//! Takes one route+trip with per-stop match results and produces the
//! changeset document: a `modify` element per matched stop, a `create`
//! element per unmatched stop, and one route relation tying the
//! platforms together in trip order.

use std::collections::HashMap;

use crate::domain::{Agency, Route, Stop, TagError, TagSet, Trip};
use crate::overpass::GeoNode;

use super::changeset::{ChangeElement, Changeset, Member, NodeElement, RelationElement};
use super::config::ReconcileConfig;

/// Tag keys that carry edit provenance on query responses.
///
/// These identify the previous editor, not the element, and must not
/// survive into synthesized output even if a response smuggles them
/// into the tag map.
const PROVENANCE_KEYS: [&str; 5] = ["changeset", "timestamp", "uid", "user", "version"];

/// One stop in trip order, with its match result.
#[derive(Debug, Clone)]
pub struct StopMatch {
    pub stop: Stop,
    pub matched: Option<GeoNode>,
}

/// Error from changeset assembly.
#[derive(Debug, thiserror::Error)]
pub enum ChangesetError {
    /// The trip visits no stops.
    #[error("trip {trip} has no stops")]
    EmptyTrip { trip: String },

    /// One stop id appears twice with different coordinates.
    #[error("stop {stop} appears twice with conflicting coordinates")]
    DuplicateStop { stop: String },

    /// The route's numeric type has no agreed classification.
    #[error("route {route}: cannot classify route type ({code})")]
    UnsupportedRouteType { route: String, code: u16 },

    /// A tag merge was attempted on a single-valued key.
    #[error(transparent)]
    Tag(#[from] TagError),
}

/// Assemble the changeset for one route+trip.
///
/// Synthetic identifiers are allocated from a single decreasing counter
/// starting at −1: the route relation takes the first id, unmatched
/// stops take subsequent ids in trip order. Identifiers are unique
/// within the returned document and never reused.
pub fn build(
    route: &Route,
    trip: &Trip,
    agency: &Agency,
    stops: &[StopMatch],
    config: &ReconcileConfig,
) -> Result<Changeset, ChangesetError> {
    if stops.is_empty() {
        return Err(ChangesetError::EmptyTrip {
            trip: trip.id.clone(),
        });
    }
    check_duplicates(stops)?;

    let route_kind = route.route_type.osm_route().ok_or_else(|| {
        ChangesetError::UnsupportedRouteType {
            route: route.id.clone(),
            code: route.route_type.code(),
        }
    })?;

    let mut next_synthetic_id = -1i64;
    let mut allocate = || {
        let id = next_synthetic_id;
        next_synthetic_id -= 1;
        id
    };

    let relation_id = allocate();
    let relation_tags = relation_tags(route, trip, agency, route_kind, &config.source);

    let mut changeset = Changeset::new(config.generator.clone());
    let mut members = Vec::with_capacity(stops.len());

    for stop_match in stops {
        let stop = &stop_match.stop;
        match &stop_match.matched {
            Some(node) => {
                let tags = merged_stop_tags(stop, node, route, agency)?;
                changeset.modify.push(ChangeElement::Node(NodeElement {
                    id: node.id,
                    lat: None,
                    lon: None,
                    version: node.meta.version,
                    tags,
                }));
                members.push(Member::platform(node.id));
            }
            None => {
                let id = allocate();
                let tags = fresh_stop_tags(stop, route, agency)?;
                changeset.create.push(ChangeElement::Node(NodeElement {
                    id,
                    lat: Some(stop.lat),
                    lon: Some(stop.lon),
                    version: 1,
                    tags,
                }));
                members.push(Member::platform(id));
            }
        }
    }

    changeset.create.push(ChangeElement::Relation(RelationElement {
        id: relation_id,
        version: 1,
        tags: relation_tags,
        members,
    }));

    Ok(changeset)
}

/// Reject repeated stop ids unless the repeat is an identical
/// coordinate pair (loop trips revisit their terminus legitimately).
fn check_duplicates(stops: &[StopMatch]) -> Result<(), ChangesetError> {
    let mut seen: HashMap<&str, (f64, f64)> = HashMap::new();
    for stop_match in stops {
        let stop = &stop_match.stop;
        match seen.get(stop.id.as_str()) {
            Some(&(lat, lon)) if lat != stop.lat || lon != stop.lon => {
                return Err(ChangesetError::DuplicateStop {
                    stop: stop.id.to_string(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(stop.id.as_str(), (stop.lat, stop.lon));
            }
        }
    }
    Ok(())
}

fn relation_tags(
    route: &Route,
    trip: &Trip,
    agency: &Agency,
    route_kind: &str,
    source: &str,
) -> TagSet {
    let mut tags = TagSet::new();
    if let Some(color) = &route.color {
        tags.insert("colour", hex_color(color));
    }
    if let Some(text_color) = &route.text_color {
        tags.insert("gtfs_route_text_color", hex_color(text_color));
    }
    tags.insert("ref", route.short_name.clone());
    tags.insert("name", format!("{}: {}", route.short_name, trip.headsign));
    tags.insert("long_name", route.long_name.clone());
    tags.insert("type", "route");
    tags.insert("route", route_kind);
    tags.insert("gtfs_route_id", route.id.clone());
    tags.insert("gtfs_agency_id", agency.id.clone());
    tags.insert("network", agency.name.clone());
    tags.insert("operator", agency.name.clone());
    tags.insert("public_transport:version", "2");
    tags.insert("source", source);
    tags.insert("to", trip.headsign.clone());
    tags
}

/// Feed hex colours come without a leading `#`.
fn hex_color(value: &str) -> String {
    if value.starts_with('#') {
        value.to_string()
    } else {
        format!("#{value}")
    }
}

/// Tags for a stop that already exists externally: the candidate's
/// surviving tags, provenance stripped, with feed values merged in.
fn merged_stop_tags(
    stop: &Stop,
    node: &GeoNode,
    route: &Route,
    agency: &Agency,
) -> Result<TagSet, TagError> {
    let mut existing = node.tags.clone();
    for key in PROVENANCE_KEYS {
        existing.remove(key);
    }
    TagSet::merge_from(
        existing,
        stop_overrides(stop),
        stop_multi_values(stop, route, agency),
    )
}

/// Tags for a stop with no external counterpart.
fn fresh_stop_tags(stop: &Stop, route: &Route, agency: &Agency) -> Result<TagSet, TagError> {
    TagSet::merge_from(
        TagSet::new(),
        stop_overrides(stop),
        stop_multi_values(stop, route, agency),
    )
}

fn stop_overrides(stop: &Stop) -> [(&str, &str); 4] {
    [
        ("bus", "yes"),
        ("highway", "bus_stop"),
        ("name", &stop.name),
        ("public_transport", "platform"),
    ]
}

fn stop_multi_values<'a>(
    stop: &'a Stop,
    route: &'a Route,
    agency: &'a Agency,
) -> [(&'a str, &'a str); 5] {
    [
        ("gtfs_id", stop.id.as_str()),
        ("network", agency.name.as_str()),
        ("operator", agency.name.as_str()),
        ("ref", stop.id.as_str()),
        ("route_ref", route.short_name.as_str()),
    ]
}
