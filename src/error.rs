//! Errors reported by chart handles.

use std::fmt;

use crate::hierarchy::{HierarchyError, NodeId};

/// Failure of a chart operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// The node ID does not belong to the chart's hierarchy.
    UnknownNode(NodeId),
    /// The input records failed validation.
    Hierarchy(HierarchyError),
    /// A JS value could not be decoded into records or config.
    Decode(String),
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::UnknownNode(id) => write!(f, "unknown node {}", id),
            ChartError::Hierarchy(err) => write!(f, "invalid hierarchy: {}", err),
            ChartError::Decode(message) => write!(f, "could not decode input: {}", message),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Hierarchy(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HierarchyError> for ChartError {
    fn from(err: HierarchyError) -> Self {
        ChartError::Hierarchy(err)
    }
}
