//! Layout algorithms for hierarchy charts.
//!
//! This module computes geometry only: polar rectangles for the sunburst and
//! node positions for the tree diagram. Layouts never mutate the hierarchy;
//! their output is a buffer indexed by [`NodeId`](crate::hierarchy::NodeId)
//! that the transition controllers interpolate and the renderer draws.

pub mod cluster;
pub mod measure;
pub mod partition;
pub mod tidy_tree;
pub mod tree;

pub use cluster::ClusterLayout;
pub use measure::{CharWidthMeasure, LabelMeasure, LabelMetrics};
pub use partition::{ArcShape, LabelPlacement, Rect, RingWindow, partition};
pub use tidy_tree::{LayoutPoint, LayoutSize, Separation, TidyTreeLayout};
pub use tree::{
    Arrangement, Projection, TreeConfig, TreeLayout, TreePoint, TreeViewport, compute_tree_layout,
    layout_tree_measured,
};
