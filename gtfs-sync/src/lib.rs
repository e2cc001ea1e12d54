//! GTFS → OpenStreetMap stop reconciliation.
//!
//! Ingests a transit schedule feed, reconciles its stops against nodes
//! already mapped externally, and produces a changeset document of
//! updates and additions, plus rider-facing timetables expanded from
//! frequency-based headways.

pub mod domain;
pub mod feed;
pub mod overpass;
pub mod reconcile;
pub mod timetable;
