//! Buchheim-Junger-Leipert tidy tree layout algorithm.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run in
//! Linear Time" (Buchheim, Junger, Leipert, 2002) for laying out arbitrary
//! m-ary trees with compact, aesthetically pleasing positioning.
//!
//! The algorithm produces (breadth, depth) coordinates per node: nodes on the
//! same level share a depth coordinate, and neighbours are kept apart by a
//! separation function measured in node-size units. Values never influence
//! spacing.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (bottom-up):** Assign preliminary breadth coordinates to
//!    each node by merging subtree contours. Uses threads for O(1) amortized
//!    contour traversal.
//! 2. **Second walk (top-down):** Apply accumulated modifiers to convert
//!    preliminary coordinates to final positions.
//! 3. **Sizing:** Scale to a fixed node size or fit into an extent.

use serde::{Deserialize, Serialize};

use crate::hierarchy::{Hierarchy, NodeId};

/// Gap rule between neighbouring nodes, in node-size units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Separation {
    /// 1 between siblings, 2 across a subtree boundary.
    #[default]
    Uniform,
    /// Like `Uniform`, divided by depth. Keeps shallow rings of a radial
    /// tree apart while packing deep ones tightly.
    DepthScaled,
}

impl Separation {
    /// Gap between `a` and its neighbour `b` on the same contour.
    pub fn between(self, hierarchy: &Hierarchy, a: NodeId, b: NodeId) -> f64 {
        let base = if hierarchy.parent(a) == hierarchy.parent(b) {
            1.0
        } else {
            2.0
        };
        match self {
            Separation::Uniform => base,
            Separation::DepthScaled => base / hierarchy.node(a).depth.max(1) as f64,
        }
    }
}

/// How layout coordinates are scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutSize {
    /// Fixed spacing: one separation unit is `breadth`, one level is `depth`.
    NodeSize { breadth: f64, depth: f64 },
    /// Fit the whole tree into `breadth` × `depth`.
    Extent { breadth: f64, depth: f64 },
}

/// A laid-out node: `x` along the breadth axis, `y` along the depth axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

/// Internal node data used during the Buchheim algorithm.
#[derive(Debug)]
struct LayoutNode {
    /// Hierarchy node this entry lays out.
    id: NodeId,
    /// Parent layout index (None for root).
    parent: Option<usize>,
    /// Children in sibling order.
    children: Vec<usize>,
    /// Preliminary x-coordinate (from first walk).
    prelim: f64,
    /// Modifier for subtree shift (accumulated in first walk, applied in second).
    modifier: f64,
    /// Contour thread for leaves (index into layout nodes).
    thread: Option<usize>,
    /// Ancestor pointer used to find the subtree to shift in apportion.
    ancestor: usize,
    /// Default ancestor for this node's children during apportion.
    default_ancestor: Option<usize>,
    /// Shift value for even spacing of intermediate children.
    shift: f64,
    /// Change value for even spacing of intermediate children.
    change: f64,
    /// Number (left-to-right index among siblings).
    number: usize,
}

/// The tidy tree layout engine.
#[derive(Debug, Clone)]
pub struct TidyTreeLayout {
    separation: Separation,
    size: LayoutSize,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout.
    pub fn new(separation: Separation, size: LayoutSize) -> Self {
        Self { separation, size }
    }

    /// Compute positions for every node, indexed by [`NodeId`].
    pub fn compute(&self, hierarchy: &Hierarchy) -> Vec<LayoutPoint> {
        let order = hierarchy.descendants();
        let (mut nodes, index_of) = Self::build_layout_tree(hierarchy, &order);

        // Post-order: every subtree is finished before its right sibling starts.
        for id in hierarchy.post_order() {
            self.first_walk(index_of[id.index()], hierarchy, &mut nodes);
        }

        let mut raw = vec![0.0; nodes.len()];
        Self::second_walk(&mut nodes, &mut raw);

        let mut points = vec![LayoutPoint::default(); hierarchy.len()];
        match self.size {
            LayoutSize::NodeSize { breadth, depth } => {
                for (v, node) in nodes.iter().enumerate() {
                    points[node.id.index()] = LayoutPoint {
                        x: raw[v] * breadth,
                        y: hierarchy.node(node.id).depth as f64 * depth,
                    };
                }
            }
            LayoutSize::Extent { breadth, depth } => {
                // Leftmost/rightmost/deepest in pre-order, first one wins ties.
                let (mut left, mut right, mut bottom) = (0, 0, 0);
                for v in 0..nodes.len() {
                    if raw[v] < raw[left] {
                        left = v;
                    }
                    if raw[v] > raw[right] {
                        right = v;
                    }
                    if hierarchy.node(nodes[v].id).depth > hierarchy.node(nodes[bottom].id).depth {
                        bottom = v;
                    }
                }
                let s = if left == right {
                    1.0
                } else {
                    self.separation
                        .between(hierarchy, nodes[left].id, nodes[right].id)
                        / 2.0
                };
                let tx = s - raw[left];
                let kx = breadth / (raw[right] + s + tx);
                let ky = depth / hierarchy.node(nodes[bottom].id).depth.max(1) as f64;
                for (v, node) in nodes.iter().enumerate() {
                    points[node.id.index()] = LayoutPoint {
                        x: (raw[v] + tx) * kx,
                        y: hierarchy.node(node.id).depth as f64 * ky,
                    };
                }
            }
        }

        log::trace!("tidy layout: {} nodes", points.len());
        points
    }

    /// Build layout nodes in pre-order; layout index `i` is `order[i]`.
    fn build_layout_tree(hierarchy: &Hierarchy, order: &[NodeId]) -> (Vec<LayoutNode>, Vec<usize>) {
        let mut index_of = vec![0usize; hierarchy.len()];
        let mut number = vec![0usize; hierarchy.len()];
        for (i, &id) in order.iter().enumerate() {
            index_of[id.index()] = i;
            for (n, child) in hierarchy.children(id).iter().enumerate() {
                number[child.index()] = n;
            }
        }

        let nodes = order
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let node = hierarchy.node(id);
                LayoutNode {
                    id,
                    parent: node.parent.map(|p| index_of[p.index()]),
                    children: node.children.iter().map(|c| index_of[c.index()]).collect(),
                    prelim: 0.0,
                    modifier: 0.0,
                    thread: None,
                    ancestor: i,
                    default_ancestor: None,
                    shift: 0.0,
                    change: 0.0,
                    number: number[id.index()],
                }
            })
            .collect();
        (nodes, index_of)
    }

    /// Buchheim first walk for one node; its children are already placed.
    fn first_walk(&self, v: usize, hierarchy: &Hierarchy, nodes: &mut [LayoutNode]) {
        let left_sibling = match nodes[v].parent {
            Some(p) if nodes[v].number > 0 => Some(nodes[p].children[nodes[v].number - 1]),
            _ => None,
        };

        if let (Some(&first), Some(&last)) = (nodes[v].children.first(), nodes[v].children.last()) {
            // Distribute extra space evenly among intermediate children
            self.execute_shifts(v, nodes);

            // Center parent over first and last children
            let midpoint = (nodes[first].prelim + nodes[last].prelim) / 2.0;
            if let Some(w) = left_sibling {
                nodes[v].prelim = nodes[w].prelim + self.separate(v, w, hierarchy, nodes);
                nodes[v].modifier = nodes[v].prelim - midpoint;
            } else {
                nodes[v].prelim = midpoint;
            }
        } else if let Some(w) = left_sibling {
            // Leaf node: position relative to left sibling
            nodes[v].prelim = nodes[w].prelim + self.separate(v, w, hierarchy, nodes);
        }

        if let Some(p) = nodes[v].parent {
            let ancestor = nodes[p].default_ancestor.unwrap_or(nodes[p].children[0]);
            let ancestor = self.apportion(v, left_sibling, ancestor, hierarchy, nodes);
            nodes[p].default_ancestor = Some(ancestor);
        }
    }

    /// Separation between two layout nodes.
    fn separate(&self, a: usize, b: usize, hierarchy: &Hierarchy, nodes: &[LayoutNode]) -> f64 {
        self.separation.between(hierarchy, nodes[a].id, nodes[b].id)
    }

    /// Get the next node on the right contour of a subtree.
    fn next_right(&self, v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.last().copied().or(nodes[v].thread)
    }

    /// Get the next node on the left contour of a subtree.
    fn next_left(&self, v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.first().copied().or(nodes[v].thread)
    }

    /// Apportion: push `v`'s subtree right until it clears every subtree to
    /// its left. This is the core of Buchheim's linear-time improvement over
    /// Walker's algorithm.
    fn apportion(
        &self,
        v: usize,
        left_sibling: Option<usize>,
        mut default_ancestor: usize,
        hierarchy: &Hierarchy,
        nodes: &mut [LayoutNode],
    ) -> usize {
        let Some(w) = left_sibling else {
            return default_ancestor;
        };
        let Some(parent) = nodes[v].parent else {
            return default_ancestor;
        };

        // inner/outer contours on the right (v side) and left (w side)
        let mut v_inner_right = v;
        let mut v_outer_right = v;
        let mut v_inner_left = w;
        let mut v_outer_left = nodes[parent].children[0];

        let mut s_inner_right = nodes[v_inner_right].modifier;
        let mut s_outer_right = nodes[v_outer_right].modifier;
        let mut s_inner_left = nodes[v_inner_left].modifier;
        let mut s_outer_left = nodes[v_outer_left].modifier;

        let (tail_left, tail_right) = loop {
            let next_il = self.next_right(v_inner_left, nodes);
            let next_ir = self.next_left(v_inner_right, nodes);
            let (Some(il), Some(ir)) = (next_il, next_ir) else {
                break (next_il, next_ir);
            };
            v_inner_left = il;
            v_inner_right = ir;

            if let Some(next) = self.next_left(v_outer_left, nodes) {
                v_outer_left = next;
            }
            if let Some(next) = self.next_right(v_outer_right, nodes) {
                v_outer_right = next;
            }
            nodes[v_outer_right].ancestor = v;

            let shift = (nodes[v_inner_left].prelim + s_inner_left)
                - (nodes[v_inner_right].prelim + s_inner_right)
                + self.separate(v_inner_left, v_inner_right, hierarchy, nodes);

            if shift > 0.0 {
                let moved = self.next_ancestor(v_inner_left, v, default_ancestor, nodes);
                self.move_subtree(moved, v, shift, nodes);
                s_inner_right += shift;
                s_outer_right += shift;
            }

            s_inner_left += nodes[v_inner_left].modifier;
            s_inner_right += nodes[v_inner_right].modifier;
            s_outer_left += nodes[v_outer_left].modifier;
            s_outer_right += nodes[v_outer_right].modifier;
        };

        // Set threads
        if let Some(next) = tail_left {
            if self.next_right(v_outer_right, nodes).is_none() {
                nodes[v_outer_right].thread = Some(next);
                nodes[v_outer_right].modifier += s_inner_left - s_outer_right;
            }
        }
        if let Some(next) = tail_right {
            if self.next_left(v_outer_left, nodes).is_none() {
                nodes[v_outer_left].thread = Some(next);
                nodes[v_outer_left].modifier += s_inner_right - s_outer_left;
                default_ancestor = v;
            }
        }

        default_ancestor
    }

    /// The sibling of `v` whose subtree contains `v_inner_left`, falling back
    /// to the default ancestor.
    fn next_ancestor(
        &self,
        v_inner_left: usize,
        v: usize,
        default_ancestor: usize,
        nodes: &[LayoutNode],
    ) -> usize {
        let candidate = nodes[v_inner_left].ancestor;
        if nodes[candidate].parent == nodes[v].parent {
            candidate
        } else {
            default_ancestor
        }
    }

    /// Move subtree: shift `wr` right and record how the shift spreads over
    /// the siblings between `wl` and `wr`.
    fn move_subtree(&self, wl: usize, wr: usize, shift: f64, nodes: &mut [LayoutNode]) {
        let subtrees = (nodes[wr].number as f64 - nodes[wl].number as f64).max(1.0);
        let per_subtree = shift / subtrees;

        nodes[wr].change -= per_subtree;
        nodes[wr].shift += shift;
        nodes[wl].change += per_subtree;
        nodes[wr].prelim += shift;
        nodes[wr].modifier += shift;
    }

    /// Execute accumulated shifts for children of node v.
    fn execute_shifts(&self, v: usize, nodes: &mut [LayoutNode]) {
        let mut shift = 0.0;
        let mut change = 0.0;

        for i in (0..nodes[v].children.len()).rev() {
            let child = nodes[v].children[i];
            nodes[child].prelim += shift;
            nodes[child].modifier += shift;
            change += nodes[child].change;
            shift += nodes[child].shift + change;
        }
    }

    /// Second walk: apply accumulated modifiers to get final x-coordinates.
    /// Layout nodes are in pre-order, so parents are final before children.
    fn second_walk(nodes: &mut [LayoutNode], final_x: &mut [f64]) {
        for v in 0..nodes.len() {
            let inherited = match nodes[v].parent {
                Some(p) => nodes[p].modifier,
                // Root sits at 0.
                None => -nodes[v].prelim,
            };
            final_x[v] = nodes[v].prelim + inherited;
            nodes[v].modifier += inherited;
        }
    }
}
