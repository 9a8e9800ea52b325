//! Cluster (dendrogram) layout.
//!
//! All leaves share the deepest level and are spaced by the separation rule;
//! each internal node is centered over its children and sits one level above
//! its tallest child.

use crate::hierarchy::{Hierarchy, NodeId};

use super::tidy_tree::{LayoutPoint, LayoutSize, Separation};

/// The cluster layout engine.
#[derive(Debug, Clone)]
pub struct ClusterLayout {
    separation: Separation,
    size: LayoutSize,
}

impl ClusterLayout {
    pub fn new(separation: Separation, size: LayoutSize) -> Self {
        Self { separation, size }
    }

    /// Compute positions for every node, indexed by [`NodeId`].
    pub fn compute(&self, hierarchy: &Hierarchy) -> Vec<LayoutPoint> {
        let mut points = vec![LayoutPoint::default(); hierarchy.len()];
        let mut previous: Option<NodeId> = None;
        let mut x = 0.0;

        // `y` here counts levels above the leaves.
        for id in hierarchy.post_order() {
            let children = hierarchy.children(id);
            if children.is_empty() {
                if let Some(prev) = previous {
                    x += self.separation.between(hierarchy, id, prev);
                }
                points[id.index()] = LayoutPoint { x, y: 0.0 };
                previous = Some(id);
            } else {
                let sum: f64 = children.iter().map(|c| points[c.index()].x).sum();
                let top = children
                    .iter()
                    .map(|c| points[c.index()].y)
                    .fold(0.0, f64::max);
                points[id.index()] = LayoutPoint {
                    x: sum / children.len() as f64,
                    y: top + 1.0,
                };
            }
        }

        let root = points[hierarchy.root().index()];
        match self.size {
            LayoutSize::NodeSize { breadth, depth } => {
                for p in &mut points {
                    p.x = (p.x - root.x) * breadth;
                    p.y = (root.y - p.y) * depth;
                }
            }
            LayoutSize::Extent { breadth, depth } => {
                let leaves = hierarchy.leaves();
                let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
                    return points;
                };
                let x0 = points[first.index()].x
                    - self.separation.between(hierarchy, first, last) / 2.0;
                let x1 = points[last.index()].x
                    + self.separation.between(hierarchy, last, first) / 2.0;
                for p in &mut points {
                    p.x = (p.x - x0) / (x1 - x0) * breadth;
                    p.y = if root.y > 0.0 {
                        (1.0 - p.y / root.y) * depth
                    } else {
                        0.0
                    };
                }
            }
        }

        log::trace!("cluster layout: {} nodes", points.len());
        points
    }
}
