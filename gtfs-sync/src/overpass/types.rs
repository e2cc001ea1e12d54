//! Overpass API response DTOs and query geometry.
//!
//! Raw elements map directly to the Overpass JSON output with `out meta`.
//! They are converted into [`GeoNode`] values at the client boundary so
//! the rest of the system never touches the wire shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{TagSet, round_coord};

/// A query rectangle in decimal degrees, on the 6-decimal grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// A box centred on a coordinate, padded by `radius_deg` on each side.
    ///
    /// The corners are rounded to the 6-decimal grid used everywhere else.
    pub fn around(lat: f64, lon: f64, radius_deg: f64) -> Self {
        Self {
            south: round_coord(lat - radius_deg),
            north: round_coord(lat + radius_deg),
            west: round_coord(lon - radius_deg),
            east: round_coord(lon + radius_deg),
        }
    }

    /// Whether the box contains a coordinate (inclusive edges).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// The `south,west,north,east` form used in Overpass QL.
    pub fn to_query_fragment(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Edit-history metadata attached to an externally sourced node.
///
/// These attributes identify who last touched the element and in which
/// edit-group. They are required for the modify path (the element's
/// current version must be echoed back) but must never be turned into
/// tags on synthesized output.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeta {
    /// Display name of the last editor.
    pub user: String,

    /// Current element version; a modify must carry this.
    pub version: u32,

    /// When the element was last edited.
    pub timestamp: DateTime<Utc>,

    /// The edit-group (changeset) of the last edit.
    pub changeset: i64,
}

/// An external node candidate returned by a bounding-box query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoNode {
    /// Opaque external identifier (always positive).
    pub id: i64,

    /// Latitude, rounded to the 6-decimal grid.
    pub lat: f64,

    /// Longitude, rounded to the 6-decimal grid.
    pub lon: f64,

    /// The element's tags.
    pub tags: TagSet,

    /// Provenance; stripped before tags are reused downstream.
    pub meta: NodeMeta,
}

/// Top-level Overpass JSON response.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<RawElement>,
}

/// One element of an Overpass response with `out meta`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub user: Option<String>,
    pub version: Option<u32>,
    pub timestamp: Option<DateTime<Utc>>,
    pub changeset: Option<i64>,
}

impl RawElement {
    /// Convert a raw node element into a [`GeoNode`].
    ///
    /// Returns `Err` with the missing field's name when coordinates or
    /// provenance are absent; callers treat that as a malformed response.
    pub fn into_node(self) -> Result<GeoNode, &'static str> {
        let lat = self.lat.ok_or("lat")?;
        let lon = self.lon.ok_or("lon")?;
        let meta = NodeMeta {
            user: self.user.ok_or("user")?,
            version: self.version.ok_or("version")?,
            timestamp: self.timestamp.ok_or("timestamp")?,
            changeset: self.changeset.ok_or("changeset")?,
        };
        Ok(GeoNode {
            id: self.id,
            lat: round_coord(lat),
            lon: round_coord(lon),
            tags: self.tags.into_iter().collect(),
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_around() {
        let bbox = BoundingBox::around(20.676543, -103.347890, 0.001);
        assert_eq!(bbox.south, 20.675543);
        assert_eq!(bbox.north, 20.677543);
        assert_eq!(bbox.west, -103.348890);
        assert_eq!(bbox.east, -103.346890);
    }

    #[test]
    fn bounding_box_contains() {
        let bbox = BoundingBox::around(20.0, -103.0, 0.01);
        assert!(bbox.contains(20.0, -103.0));
        assert!(bbox.contains(20.009, -103.009));
        assert!(!bbox.contains(20.02, -103.0));
        assert!(!bbox.contains(20.0, -102.9));
    }

    #[test]
    fn query_fragment_uses_six_decimals() {
        let bbox = BoundingBox::around(20.5, -103.25, 0.001);
        assert_eq!(
            bbox.to_query_fragment(),
            "20.499000,-103.251000,20.501000,-103.249000"
        );
    }

    #[test]
    fn raw_element_converts() {
        let json = r#"{
            "type": "node",
            "id": 4456121000,
            "lat": 20.6765432,
            "lon": -103.3478899,
            "timestamp": "2023-05-14T12:00:00Z",
            "version": 3,
            "changeset": 136112281,
            "user": "mapper_gdl",
            "tags": {"highway": "bus_stop", "ref": "S012"}
        }"#;
        let raw: RawElement = serde_json::from_str(json).unwrap();
        let node = raw.into_node().unwrap();

        assert_eq!(node.id, 4456121000);
        assert_eq!(node.lat, 20.676543);
        assert_eq!(node.tags.get("ref"), Some("S012"));
        assert_eq!(node.meta.version, 3);
        assert_eq!(node.meta.user, "mapper_gdl");
    }

    #[test]
    fn raw_element_missing_meta_is_rejected() {
        let json = r#"{"type": "node", "id": 1, "lat": 20.0, "lon": -103.0}"#;
        let raw: RawElement = serde_json::from_str(json).unwrap();
        assert_eq!(raw.into_node().unwrap_err(), "user");
    }
}
