//! Reconciliation of feed stops against the external node database.
//!
//! This module contains the core pipeline: per-stop candidate queries
//! (through the [`crate::overpass::NodeQuery`] trait), geometric and
//! identifier matching, and changeset assembly with stable synthetic
//! identifiers.

mod builder;
mod changeset;
mod config;
mod matcher;
mod sync;

pub use builder::{ChangesetError, StopMatch, build};
pub use changeset::{
    ChangeElement, Changeset, Member, MemberKind, NodeElement, RelationElement,
};
pub use config::ReconcileConfig;
pub use matcher::{MatchOutcome, match_stop};
pub use sync::{CancelToken, ReconcileError, ReconcileReport, Reconciler};
