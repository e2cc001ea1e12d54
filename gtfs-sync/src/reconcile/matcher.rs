//! Geometric and identifier matching of stops against external nodes.

use crate::domain::Stop;
use crate::overpass::GeoNode;

/// The result of matching one stop against a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// The winning candidate, if any qualified.
    pub node: Option<GeoNode>,

    /// How many further candidates also qualified but were discarded.
    ///
    /// First-match-wins is the resolution policy, but silent discards
    /// would hide genuinely ambiguous geometry, so the count is
    /// surfaced for the caller to report.
    pub discarded: usize,
}

/// Match a stop against candidates, in the order the query returned them.
///
/// A candidate qualifies when its coordinates agree with the stop's
/// within `epsilon` degrees on both axes, or when its `ref` tag equals
/// the stop's identifier, so a stop that has been remapped at a
/// slightly different position still matches by identifier.
///
/// Both sides of the coordinate comparison are already rounded to 6
/// decimal places, which makes `5e-7` the natural minimum epsilon:
/// anything smaller reintroduces false negatives from the rounding
/// itself.
pub fn match_stop(stop: &Stop, candidates: Vec<GeoNode>, epsilon: f64) -> MatchOutcome {
    let mut qualifying = candidates.into_iter().filter(|c| qualifies(stop, c, epsilon));
    let node = qualifying.next();
    let discarded = qualifying.count();
    MatchOutcome { node, discarded }
}

fn qualifies(stop: &Stop, candidate: &GeoNode, epsilon: f64) -> bool {
    let coords_agree = (candidate.lat - stop.lat).abs() <= epsilon
        && (candidate.lon - stop.lon).abs() <= epsilon;
    coords_agree || candidate.tags.get("ref") == Some(stop.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopId, TagSet};
    use crate::overpass::NodeMeta;
    use chrono::{TimeZone, Utc};

    const EPSILON: f64 = 5e-7;

    fn stop() -> Stop {
        Stop::new(StopId::parse("S012").unwrap(), "Centro", 20.676543, -103.347890)
    }

    fn node(id: i64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> GeoNode {
        GeoNode {
            id,
            lat,
            lon,
            tags: tags.iter().copied().collect::<TagSet>(),
            meta: NodeMeta {
                user: "mapper".into(),
                version: 2,
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                changeset: 100,
            },
        }
    }

    #[test]
    fn empty_candidates_yield_no_match() {
        let outcome = match_stop(&stop(), Vec::new(), EPSILON);
        assert_eq!(outcome.node, None);
        assert_eq!(outcome.discarded, 0);
    }

    #[test]
    fn exact_coordinates_match() {
        let outcome = match_stop(
            &stop(),
            vec![node(1, 20.676543, -103.347890, &[])],
            EPSILON,
        );
        assert_eq!(outcome.node.unwrap().id, 1);
    }

    #[test]
    fn coordinates_within_epsilon_match() {
        // Half a grid step off on both axes
        let outcome = match_stop(
            &stop(),
            vec![node(1, 20.6765432, -103.3478903, &[])],
            EPSILON,
        );
        assert!(outcome.node.is_some());
    }

    #[test]
    fn coordinates_beyond_epsilon_do_not_match() {
        let outcome = match_stop(&stop(), vec![node(1, 20.676553, -103.347890, &[])], EPSILON);
        assert_eq!(outcome.node, None);
    }

    #[test]
    fn ref_tag_matches_despite_distant_coordinates() {
        let outcome = match_stop(
            &stop(),
            vec![node(7, 20.70, -103.30, &[("ref", "S012")])],
            EPSILON,
        );
        assert_eq!(outcome.node.unwrap().id, 7);
    }

    #[test]
    fn ref_tag_mismatch_does_not_match() {
        let outcome = match_stop(
            &stop(),
            vec![node(7, 20.70, -103.30, &[("ref", "S999")])],
            EPSILON,
        );
        assert_eq!(outcome.node, None);
    }

    #[test]
    fn first_qualifying_candidate_wins() {
        let outcome = match_stop(
            &stop(),
            vec![
                node(1, 19.0, -102.0, &[]),
                node(2, 20.676543, -103.347890, &[]),
                node(3, 20.676543, -103.347890, &[]),
            ],
            EPSILON,
        );
        assert_eq!(outcome.node.unwrap().id, 2);
        assert_eq!(outcome.discarded, 1);
    }

    #[test]
    fn discard_count_spans_both_conditions() {
        let outcome = match_stop(
            &stop(),
            vec![
                node(1, 20.676543, -103.347890, &[]),
                node(2, 19.0, -102.0, &[("ref", "S012")]),
                node(3, 20.676543, -103.347890, &[]),
            ],
            EPSILON,
        );
        assert_eq!(outcome.node.unwrap().id, 1);
        assert_eq!(outcome.discarded, 2);
    }

    #[test]
    fn wider_epsilon_widens_the_net() {
        let candidate = node(1, 20.6766, -103.3479, &[]);
        assert!(match_stop(&stop(), vec![candidate.clone()], EPSILON).node.is_none());
        assert!(match_stop(&stop(), vec![candidate], 1e-4).node.is_some());
    }
}
