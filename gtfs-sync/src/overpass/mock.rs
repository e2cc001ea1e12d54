//! Static node source for testing without network access.

use super::NodeQuery;
use super::error::OverpassError;
use super::types::{BoundingBox, GeoNode};

/// A [`NodeQuery`] backed by a fixed node list.
///
/// Answers each bounding-box query with the subset of its nodes whose
/// coordinates fall inside the box, in insertion order: the same
/// contract the live client provides, minus the network.
#[derive(Debug, Clone, Default)]
pub struct StaticNodes {
    nodes: Vec<GeoNode>,
}

impl StaticNodes {
    /// Create a source over a fixed set of nodes.
    pub fn new(nodes: Vec<GeoNode>) -> Self {
        Self { nodes }
    }

    /// A source that returns nothing for every query.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl NodeQuery for StaticNodes {
    async fn nodes_in(&self, bbox: &BoundingBox) -> Result<Vec<GeoNode>, OverpassError> {
        Ok(self
            .nodes
            .iter()
            .filter(|n| bbox.contains(n.lat, n.lon))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TagSet;
    use crate::overpass::NodeMeta;
    use chrono::{TimeZone, Utc};

    fn node(id: i64, lat: f64, lon: f64) -> GeoNode {
        GeoNode {
            id,
            lat,
            lon,
            tags: TagSet::new(),
            meta: NodeMeta {
                user: "tester".into(),
                version: 1,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                changeset: 1,
            },
        }
    }

    #[tokio::test]
    async fn filters_to_bbox() {
        let source = StaticNodes::new(vec![
            node(1, 20.0, -103.0),
            node(2, 21.0, -103.0),
            node(3, 20.0005, -103.0005),
        ]);

        let bbox = BoundingBox::around(20.0, -103.0, 0.001);
        let found = source.nodes_in(&bbox).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[tokio::test]
    async fn empty_source_returns_nothing() {
        let source = StaticNodes::empty();
        let bbox = BoundingBox::around(20.0, -103.0, 0.01);
        assert!(source.nodes_in(&bbox).await.unwrap().is_empty());
    }
}
