//! Validation errors raised while building a hierarchy.

use std::fmt;

/// Invalid input detected at hierarchy-build time.
///
/// `path` fields hold the slash-joined names from the root to the offending
/// record, e.g. `root/A/B`.
#[derive(Debug, Clone, PartialEq)]
pub enum HierarchyError {
    /// A record has an empty name.
    EmptyName { path: String },
    /// A record carries a negative value.
    NegativeValue { path: String, value: f64 },
    /// A record carries NaN or an infinite value.
    NonFiniteValue { path: String },
    /// The edge list contains a cycle through this node.
    Cycle { node: u32 },
    /// Every node in the edge list has a parent.
    MissingRoot,
    /// More than one node has no parent.
    MultipleRoots { roots: Vec<u32> },
    /// An edge references a node index outside the name table.
    UnknownNode { index: u32 },
    /// A node has more than one parent, or the edge array is malformed.
    InvalidEdges(String),
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyError::EmptyName { path } => {
                write!(f, "record at '{}' has an empty name", path)
            }
            HierarchyError::NegativeValue { path, value } => {
                write!(f, "record '{}' has negative value {}", path, value)
            }
            HierarchyError::NonFiniteValue { path } => {
                write!(f, "record '{}' has a non-finite value", path)
            }
            HierarchyError::Cycle { node } => {
                write!(f, "edge list contains a cycle through node {}", node)
            }
            HierarchyError::MissingRoot => write!(f, "edge list has no root node"),
            HierarchyError::MultipleRoots { roots } => {
                write!(f, "edge list has multiple roots: {:?}", roots)
            }
            HierarchyError::UnknownNode { index } => {
                write!(f, "edge references unknown node {}", index)
            }
            HierarchyError::InvalidEdges(message) => write!(f, "invalid edges: {}", message),
        }
    }
}

impl std::error::Error for HierarchyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = HierarchyError::NegativeValue {
            path: "root/A".to_string(),
            value: -2.0,
        };
        assert_eq!(err.to_string(), "record 'root/A' has negative value -2");
    }
}
