//! Changeset document model.
//!
//! The output of a reconciliation run: three ordered collections of
//! elements to create, modify, and delete. The serialized JSON shape is
//! fixed by the downstream import tooling; field names and nesting here
//! must not change without coordinating with it.

use serde::Serialize;

use crate::domain::TagSet;

/// Document format version expected by the import tooling.
const FORMAT_VERSION: &str = "0.6";

/// The kind of element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Node,
}

/// One ordered member of a relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: MemberKind,

    /// Element id: positive for existing elements, negative for
    /// placeholders defined elsewhere in the same document.
    #[serde(rename = "ref")]
    pub element_ref: i64,

    /// Function of the member within the relation.
    pub role: String,
}

impl Member {
    /// A node member with the platform role.
    pub fn platform(element_ref: i64) -> Self {
        Self {
            kind: MemberKind::Node,
            element_ref,
            role: "platform".to_string(),
        }
    }
}

/// A node element.
///
/// Creates carry coordinates; modifies omit them so the existing
/// position is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeElement {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub version: u32,
    pub tags: TagSet,
}

/// A relation element with ordered members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationElement {
    pub id: i64,
    pub version: u32,
    pub tags: TagSet,
    pub members: Vec<Member>,
}

/// One element of a changeset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChangeElement {
    Node(NodeElement),
    Relation(RelationElement),
}

impl ChangeElement {
    /// The element's identifier.
    pub fn id(&self) -> i64 {
        match self {
            ChangeElement::Node(n) => n.id,
            ChangeElement::Relation(r) => r.id,
        }
    }
}

/// A complete changeset document.
///
/// `delete` is always empty in this system: the feed never signals that
/// a stop has been removed, so nothing is ever torn down externally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changeset {
    version: &'static str,
    generator: String,
    pub create: Vec<ChangeElement>,
    pub modify: Vec<ChangeElement>,
    pub delete: Vec<ChangeElement>,
}

impl Changeset {
    /// An empty changeset attributed to `generator`.
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            version: FORMAT_VERSION,
            generator: generator.into(),
            create: Vec::new(),
            modify: Vec::new(),
            delete: Vec::new(),
        }
    }

    /// Total number of elements across all three collections.
    pub fn len(&self) -> usize {
        self.create.len() + self.modify.len() + self.delete.len()
    }

    /// Whether the changeset holds no elements at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
