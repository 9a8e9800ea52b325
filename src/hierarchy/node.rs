//! Node types for the hierarchy arena.
//!
//! A hierarchy is stored as a flat arena of [`HierarchyNode`]s. Each node has:
//! - A stable identifier (its arena index, valid for the life of the tree)
//! - The name and aggregated value of the input record
//! - Depth (distance from root) and height (distance to deepest leaf)
//! - Parent and ordered children links

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier.
///
/// This ID is the node's index in its hierarchy's arena. It stays valid when
/// siblings are reordered, since sorting only permutes child lists.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root of every hierarchy.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// A raw hierarchical record, as handed over by the data-loading layer.
///
/// `{ name: string, value?: number, children?: Record[] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Display name, unique among siblings.
    pub name: String,
    /// Explicit value. Only meaningful on leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Nested records. Empty means leaf.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Record>,
}

impl Record {
    /// A leaf record with an explicit value.
    pub fn leaf(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// An internal record; its value is derived from the children.
    pub fn branch(name: impl Into<String>, children: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children,
        }
    }
}

/// A node of a built hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    /// Name copied from the input record.
    pub name: String,
    /// Leaf value, or the sum of the children's values.
    pub value: f64,
    /// Distance from the root (root = 0).
    pub depth: u32,
    /// Longest distance to a descendant leaf (leaves = 0).
    pub height: u32,
    /// Parent node (None for the root).
    pub parent: Option<NodeId>,
    /// Children in the current sibling order.
    pub children: Vec<NodeId>,
    /// Position among siblings in the input. Used to break sort ties.
    pub input_index: usize,
}

impl HierarchyNode {
    /// Whether this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
