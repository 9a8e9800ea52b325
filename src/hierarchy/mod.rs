//! Hierarchy construction and traversal.
//!
//! This module converts raw nested [`Record`]s into an arena-backed tree with
//! aggregated values and depth/height metadata. The tree shape is immutable
//! once built; only the sibling order can be changed, and geometry lives in
//! separate per-layout buffers indexed by [`NodeId`].

mod builder;
mod error;
mod node;
mod stratify;

pub use builder::{Hierarchy, SiblingOrder};
pub use error::HierarchyError;
pub use node::{HierarchyNode, NodeId, Record};
