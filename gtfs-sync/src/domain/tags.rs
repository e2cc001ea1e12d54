//! OSM-style tag collections with multi-valued merge semantics.
//!
//! A handful of keys on transit stops hold semicolon-joined value sets
//! rather than a single value: a stop served by two networks carries
//! `network=A;B`. Merging feed data into an existing element must union
//! those sets rather than overwrite them, so that values already present
//! upstream survive the merge.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::ser::{SerializeSeq, Serializer};

/// Keys whose values are semicolon-joined sets rather than single values.
pub const MULTI_VALUE_KEYS: [&str; 5] = ["gtfs_id", "network", "operator", "ref", "route_ref"];

/// Error from a tag merge operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// The key is single-valued and cannot take a set merge.
    #[error("tag key `{0}` is not multi-valued")]
    NotMultiValued(String),
}

/// An ordered key → value tag mapping.
///
/// Keys are unique; iteration and serialization order is lexicographic by
/// key. Values of the keys in [`MULTI_VALUE_KEYS`] are semicolon-joined
/// sets, and [`TagSet::merge_value`] keeps the joined encoding sorted.
/// That sorted join is a stability guarantee: two merges over the same
/// values always produce byte-identical output.
///
/// # Examples
///
/// ```
/// use gtfs_sync::domain::TagSet;
///
/// let mut tags = TagSet::new();
/// tags.insert("network", "SITEUR");
/// tags.merge_value("route_ref", "C01").unwrap();
/// tags.merge_value("route_ref", "A02").unwrap();
/// assert_eq!(tags.get("route_ref"), Some("A02;C01"));
///
/// // Single-valued keys reject set merges
/// assert!(tags.merge_value("name", "anything").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: BTreeMap<String, String>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` is one of the recognized multi-valued keys.
    pub fn is_multi_valued(key: &str) -> bool {
        MULTI_VALUE_KEYS.contains(&key)
    }

    /// Set a single-valued key, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns true if the set contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Union `value` into the semicolon-joined set held under a
    /// multi-valued `key`.
    ///
    /// The existing entry is split on `;`, the new value added, and the
    /// result rejoined in sorted order. Values already present are kept;
    /// merging never discards an existing member of the set.
    ///
    /// Fails with [`TagError::NotMultiValued`] for any key outside
    /// [`MULTI_VALUE_KEYS`].
    pub fn merge_value(&mut self, key: &str, value: &str) -> Result<(), TagError> {
        if !Self::is_multi_valued(key) {
            return Err(TagError::NotMultiValued(key.to_string()));
        }

        let mut values: BTreeSet<&str> = match self.entries.get(key) {
            Some(existing) => existing.split(';').filter(|v| !v.is_empty()).collect(),
            None => BTreeSet::new(),
        };
        values.insert(value);

        let joined = values.into_iter().collect::<Vec<_>>().join(";");
        self.entries.insert(key.to_string(), joined);
        Ok(())
    }

    /// Merge feed-derived tags into an existing tag set.
    ///
    /// `overrides` are single-valued keys whose incoming value replaces
    /// whatever is present; keys of `existing` without an override are
    /// retained untouched. `multi` values are unioned per
    /// [`TagSet::merge_value`].
    pub fn merge_from<'a>(
        existing: TagSet,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
        multi: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<TagSet, TagError> {
        let mut merged = existing;
        for (key, value) in overrides {
            merged.insert(key, value);
        }
        for (key, value) in multi {
            merged.merge_value(key, value)?;
        }
        Ok(merged)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct Pair<'a> {
    k: &'a str,
    v: &'a str,
}

impl Serialize for TagSet {
    /// Serializes as a `[{k, v}, ...]` sequence in key order, the shape
    /// the changeset import tooling expects.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            seq.serialize_element(&Pair { k, v })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_last_write_wins() {
        let mut tags = TagSet::new();
        tags.insert("name", "Old Name");
        tags.insert("name", "New Name");
        assert_eq!(tags.get("name"), Some("New Name"));
    }

    #[test]
    fn merge_value_starts_fresh_set() {
        let mut tags = TagSet::new();
        tags.merge_value("operator", "SITEUR").unwrap();
        assert_eq!(tags.get("operator"), Some("SITEUR"));
    }

    #[test]
    fn merge_value_unions_existing() {
        let mut tags = TagSet::new();
        tags.insert("network", "Mi Transporte");
        tags.merge_value("network", "SITEUR").unwrap();
        assert_eq!(tags.get("network"), Some("Mi Transporte;SITEUR"));
    }

    #[test]
    fn merge_value_deduplicates() {
        let mut tags = TagSet::new();
        tags.insert("ref", "C01;C02");
        tags.merge_value("ref", "C01").unwrap();
        assert_eq!(tags.get("ref"), Some("C01;C02"));
    }

    #[test]
    fn merge_value_joins_sorted() {
        let mut tags = TagSet::new();
        tags.merge_value("route_ref", "C03").unwrap();
        tags.merge_value("route_ref", "A01").unwrap();
        tags.merge_value("route_ref", "B02").unwrap();
        assert_eq!(tags.get("route_ref"), Some("A01;B02;C03"));
    }

    #[test]
    fn merge_value_drops_empty_fragments() {
        let mut tags = TagSet::new();
        tags.insert("ref", ";C01;");
        tags.merge_value("ref", "C02").unwrap();
        assert_eq!(tags.get("ref"), Some("C01;C02"));
    }

    #[test]
    fn merge_value_rejects_single_valued_key() {
        let mut tags = TagSet::new();
        let err = tags.merge_value("name", "Stop").unwrap_err();
        assert_eq!(err, TagError::NotMultiValued("name".to_string()));
    }

    #[test]
    fn merge_from_keeps_unoverridden_keys() {
        let existing: TagSet = [("shelter", "yes"), ("name", "Old")].into_iter().collect();
        let merged = TagSet::merge_from(
            existing,
            [("name", "New")],
            [("gtfs_id", "S1"), ("network", "SITEUR")],
        )
        .unwrap();

        assert_eq!(merged.get("shelter"), Some("yes"));
        assert_eq!(merged.get("name"), Some("New"));
        assert_eq!(merged.get("gtfs_id"), Some("S1"));
        assert_eq!(merged.get("network"), Some("SITEUR"));
    }

    #[test]
    fn serializes_as_sorted_pairs() {
        let tags: TagSet = [("name", "Centro"), ("bus", "yes")].into_iter().collect();
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"[{"k":"bus","v":"yes"},{"k":"name","v":"Centro"}]"#);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn value_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_]{1,8}"
    }

    proptest! {
        /// Every value in the existing set survives a merge.
        #[test]
        fn merge_never_loses_values(
            existing in proptest::collection::btree_set(value_strategy(), 0..6),
            incoming in value_strategy(),
        ) {
            let mut tags = TagSet::new();
            if !existing.is_empty() {
                let joined = existing.iter().cloned().collect::<Vec<_>>().join(";");
                tags.insert("network", joined);
            }

            tags.merge_value("network", &incoming).unwrap();

            let merged: BTreeSet<&str> = tags.get("network").unwrap().split(';').collect();
            for value in &existing {
                prop_assert!(merged.contains(value.as_str()));
            }
            prop_assert!(merged.contains(incoming.as_str()));
        }

        /// Merging is idempotent: a second identical merge changes nothing.
        #[test]
        fn merge_idempotent(
            values in proptest::collection::vec(value_strategy(), 1..6),
        ) {
            let mut tags = TagSet::new();
            for v in &values {
                tags.merge_value("ref", v).unwrap();
            }
            let before = tags.get("ref").unwrap().to_string();
            for v in &values {
                tags.merge_value("ref", v).unwrap();
            }
            prop_assert_eq!(tags.get("ref").unwrap(), before.as_str());
        }
    }
}
