//! Node identity and the flat node value type.
//!
//! A [`Node`] is one entry of the hierarchy: an id, an optional parent
//! reference, a display label, and an opaque payload the engine never
//! inspects. Nodes are flat — children are discovered through the
//! [`NodeStore`](crate::store::NodeStore) index, never by nesting.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, unique within a store.
///
/// Ids are opaque strings supplied by the data source. The newtype keeps
/// them from being confused with labels or payload fields at call sites.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One entry of the hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Parent reference; `None` marks a top-level node.
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Display label.
    pub label: String,
    /// Opaque payload carried for the consumer; never interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Node {
    /// Create a top-level node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: label.into(),
            payload: None,
        }
    }

    /// Set the parent reference.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Attach an opaque payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Whether this node declares no parent.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}
