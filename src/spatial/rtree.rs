//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Nearest neighbor
//! - Nearest neighbor within a pick radius
//! - Rectangle intersection

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::hierarchy::NodeId;

/// A node position on the tree canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

impl NodePoint {
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over drawn node positions.
///
/// Rebuilt in bulk on the first query after the tree diagram moves.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Replace the indexed points. Bulk loading beats incremental inserts
    /// for full-frame updates.
    pub fn rebuild(&mut self, points: impl IntoIterator<Item = NodePoint>) {
        self.tree = RTree::bulk_load(points.into_iter().collect());
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, x: f64, y: f64) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|point| point.id)
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f64, y: f64, max_distance: f64) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id)
    }

    /// Find all nodes within a rectangle.
    pub fn in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<NodeId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut ids: Vec<NodeId> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|point| point.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
