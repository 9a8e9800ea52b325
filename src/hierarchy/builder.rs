//! Hierarchy builder - arena construction, aggregation and sibling ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::HierarchyError;
use super::node::{HierarchyNode, NodeId, Record};

/// Sibling ordering policy.
///
/// Ordering is a view over the tree: it permutes child lists but never adds,
/// removes or renumbers nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiblingOrder {
    /// Keep the input order.
    Input,
    /// Descending height, ties broken by input order.
    ByHeight,
    /// Descending aggregated value, ties broken by input order.
    #[default]
    ByValue,
}

/// A built hierarchy.
///
/// Nodes are stored in pre-order of the input, so the root is always
/// [`NodeId::ROOT`] and every parent has a smaller index than its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    order: SiblingOrder,
}

impl Hierarchy {
    /// Build a hierarchy from a root record.
    ///
    /// Validates every record (non-empty name, finite non-negative value),
    /// assigns depth and height, and aggregates values bottom-up. The input
    /// is never mutated. Siblings keep their input order.
    pub fn build(record: &Record) -> Result<Self, HierarchyError> {
        let mut nodes: Vec<HierarchyNode> = Vec::new();

        // Explicit stack instead of recursion so very deep inputs are fine.
        // (record, parent, index among siblings, depth)
        let mut stack: Vec<(&Record, Option<NodeId>, usize, u32)> = vec![(record, None, 0, 0)];

        while let Some((rec, parent, input_index, depth)) = stack.pop() {
            Self::validate(&rec.name, rec.value, parent, &nodes)?;
            let id = Self::push_node(
                &mut nodes,
                rec.name.clone(),
                rec.value,
                parent,
                input_index,
                depth,
                rec.children.len(),
            );

            // Reverse push so the first child is popped (and numbered) first.
            for (index, child) in rec.children.iter().enumerate().rev() {
                stack.push((child, Some(id), index, depth + 1));
            }
        }

        Ok(Self::from_pre_order(nodes))
    }

    /// Append a node and link it under its parent. Leaf values are final,
    /// internal values are filled in by [`Self::from_pre_order`].
    pub(super) fn push_node(
        nodes: &mut Vec<HierarchyNode>,
        name: String,
        value: Option<f64>,
        parent: Option<NodeId>,
        input_index: usize,
        depth: u32,
        child_count: usize,
    ) -> NodeId {
        let id = NodeId(nodes.len() as u32);
        let value = if child_count == 0 {
            value.unwrap_or(0.0)
        } else {
            0.0
        };

        nodes.push(HierarchyNode {
            name,
            value,
            depth,
            height: 0,
            parent,
            children: Vec::with_capacity(child_count),
            input_index,
        });

        if let Some(parent) = parent {
            nodes[parent.index()].children.push(id);
        }
        id
    }

    /// Finish an arena filled in pre-order: aggregate values and heights.
    pub(super) fn from_pre_order(mut nodes: Vec<HierarchyNode>) -> Self {
        // Pre-order numbering: walking backwards visits children before parents.
        for i in (0..nodes.len()).rev() {
            if nodes[i].children.is_empty() {
                continue;
            }
            let mut sum = 0.0;
            let mut height = 0;
            for &child in &nodes[i].children {
                sum += nodes[child.index()].value;
                height = height.max(nodes[child.index()].height + 1);
            }
            nodes[i].value = sum;
            nodes[i].height = height;
        }

        log::debug!(
            "built hierarchy: {} nodes, height {}, total value {}",
            nodes.len(),
            nodes[0].height,
            nodes[0].value
        );

        Self {
            nodes,
            order: SiblingOrder::Input,
        }
    }

    /// Build a hierarchy and apply a sibling order in one step.
    pub fn build_sorted(record: &Record, order: SiblingOrder) -> Result<Self, HierarchyError> {
        let mut hierarchy = Self::build(record)?;
        hierarchy.sort(order);
        Ok(hierarchy)
    }

    pub(super) fn validate(
        name: &str,
        value: Option<f64>,
        parent: Option<NodeId>,
        nodes: &[HierarchyNode],
    ) -> Result<(), HierarchyError> {
        let path = || {
            let mut path = parent
                .map(|p| Self::path_in(nodes, p, "/"))
                .unwrap_or_default();
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(name);
            path
        };

        if name.is_empty() {
            return Err(HierarchyError::EmptyName { path: path() });
        }
        if let Some(value) = value {
            if !value.is_finite() {
                return Err(HierarchyError::NonFiniteValue { path: path() });
            }
            if value < 0.0 {
                return Err(HierarchyError::NegativeValue {
                    path: path(),
                    value,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Sibling Ordering
    // =========================================================================

    /// Reorder every child list according to `order`.
    pub fn sort(&mut self, order: SiblingOrder) {
        let keys: Vec<(u32, f64, usize)> = self
            .nodes
            .iter()
            .map(|n| (n.height, n.value, n.input_index))
            .collect();

        for node in &mut self.nodes {
            node.children.sort_by(|&a, &b| {
                let (ha, va, ia) = keys[a.index()];
                let (hb, vb, ib) = keys[b.index()];
                let primary = match order {
                    SiblingOrder::Input => Ordering::Equal,
                    SiblingOrder::ByHeight => hb.cmp(&ha),
                    SiblingOrder::ByValue => vb.total_cmp(&va),
                };
                primary.then(ia.cmp(&ib))
            });
        }
        self.order = order;
    }

    /// Return a copy with a different sibling order.
    pub fn sorted(&self, order: SiblingOrder) -> Self {
        let mut copy = self.clone();
        copy.sort(order);
        copy
    }

    /// The sibling order currently applied.
    pub fn order(&self) -> SiblingOrder {
        self.order
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A built hierarchy always has at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tree height (the root's height).
    #[inline]
    pub fn height(&self) -> u32 {
        self.nodes[0].height
    }

    /// Get a node. Panics on an ID from another hierarchy.
    #[inline]
    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.index()]
    }

    /// Get a node if the ID is in range.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id.index())
    }

    /// Whether the ID belongs to this hierarchy.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Children in the current sibling order.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Parent of a node (None for the root).
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// All node IDs in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// The node itself followed by its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Pre-order traversal following the current sibling order.
    pub fn descendants(&self) -> Vec<NodeId> {
        self.descendants_of(NodeId::ROOT)
    }

    /// Pre-order traversal of a subtree.
    pub fn descendants_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Post-order traversal following the current sibling order.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        // (node, children visited)
        let mut stack = vec![(NodeId::ROOT, false)];
        while let Some((n, expanded)) = stack.pop() {
            if expanded {
                out.push(n);
                continue;
            }
            stack.push((n, true));
            for &child in self.children(n).iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|&id| self.node(id).is_leaf())
            .collect()
    }

    /// Parent→child links in pre-order.
    pub fn links(&self) -> Vec<(NodeId, NodeId)> {
        self.descendants()
            .into_iter()
            .filter_map(|id| self.parent(id).map(|p| (p, id)))
            .collect()
    }

    /// Names from the root down to `id`, joined by `sep` (e.g. `root/A/B`).
    pub fn path_label(&self, id: NodeId, sep: &str) -> String {
        Self::path_in(&self.nodes, id, sep)
    }

    fn path_in(nodes: &[HierarchyNode], id: NodeId, sep: &str) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            names.push(nodes[n.index()].name.as_str());
            current = nodes[n.index()].parent;
        }
        names.reverse();
        names.join(sep)
    }

    /// The child of the root whose subtree contains `id` (None for the root).
    pub fn branch_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == NodeId::ROOT {
                return Some(current);
            }
            current = parent;
        }
    }
}
