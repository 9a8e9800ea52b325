//! Build a hierarchy from a flat parent→child edge list.
//!
//! Tabular sources describe trees as rows plus `[parent0, child0, parent1,
//! child1, ...]` edge pairs rather than nested records. The edges are loaded
//! into a petgraph `DiGraph` to reject cycles and find the unique root, then
//! the arena is filled in pre-order straight from the child lists. No nested
//! [`Record`](super::Record) is materialised, so chains of any length work.

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::builder::Hierarchy;
use super::error::HierarchyError;
use super::node::{HierarchyNode, NodeId};

impl Hierarchy {
    /// Build a hierarchy from node names, optional leaf values and directed
    /// edge pairs.
    ///
    /// Children keep the order in which their edges appear. Arena ids are
    /// pre-order, so they generally differ from row indices; use
    /// [`Hierarchy::stratify`] to get the row → [`NodeId`] table.
    pub fn from_edges(
        names: &[String],
        values: &[Option<f64>],
        edges: &[u32],
    ) -> Result<Self, HierarchyError> {
        Self::stratify(names, values, edges).map(|(hierarchy, _)| hierarchy)
    }

    /// Like [`Hierarchy::from_edges`], also returning the [`NodeId`] assigned
    /// to each input row (`ids[row]`).
    pub fn stratify(
        names: &[String],
        values: &[Option<f64>],
        edges: &[u32],
    ) -> Result<(Self, Vec<NodeId>), HierarchyError> {
        let node_count = names.len();

        if edges.len() % 2 != 0 {
            return Err(HierarchyError::InvalidEdges(format!(
                "odd edge array length {}",
                edges.len()
            )));
        }

        let mut graph: DiGraph<u32, ()> = DiGraph::with_capacity(node_count, edges.len() / 2);
        for i in 0..node_count {
            graph.add_node(i as u32);
        }

        let mut children: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        let mut has_parent = vec![false; node_count];

        for pair in edges.chunks_exact(2) {
            let (parent, child) = (pair[0], pair[1]);
            for index in [parent, child] {
                if index as usize >= node_count {
                    return Err(HierarchyError::UnknownNode { index });
                }
            }
            if parent == child {
                return Err(HierarchyError::Cycle { node: parent });
            }
            if has_parent[child as usize] {
                return Err(HierarchyError::InvalidEdges(format!(
                    "node {} has more than one parent",
                    child
                )));
            }
            has_parent[child as usize] = true;
            children[parent as usize].push(child);
            graph.add_edge(NodeIndex::new(parent as usize), NodeIndex::new(child as usize), ());
        }

        toposort(&graph, None).map_err(|cycle| HierarchyError::Cycle {
            node: graph[cycle.node_id()],
        })?;

        let roots: Vec<u32> = graph
            .node_indices()
            .filter(|&n| {
                graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| graph[n])
            .collect();

        let root = match roots.as_slice() {
            [] => return Err(HierarchyError::MissingRoot),
            [root] => *root,
            _ => return Err(HierarchyError::MultipleRoots { roots }),
        };

        // Acyclic, one root and at most one parent each: every row is reached.
        let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(node_count);
        let mut ids = vec![NodeId::ROOT; node_count];
        // (row, parent, index among siblings, depth)
        let mut stack: Vec<(u32, Option<NodeId>, usize, u32)> = vec![(root, None, 0, 0)];

        while let Some((row, parent, input_index, depth)) = stack.pop() {
            let slot = row as usize;
            let value = values.get(slot).copied().flatten();
            Self::validate(&names[slot], value, parent, &nodes)?;
            let id = Self::push_node(
                &mut nodes,
                names[slot].clone(),
                value,
                parent,
                input_index,
                depth,
                children[slot].len(),
            );
            ids[slot] = id;

            for (index, &child) in children[slot].iter().enumerate().rev() {
                stack.push((child, Some(id), index, depth + 1));
            }
        }

        log::debug!(
            "stratified {} nodes from {} edges, root {}",
            node_count,
            edges.len() / 2,
            root
        );
        Ok((Self::from_pre_order(nodes), ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_stratify() {
        // root(0) → A(1), root(0) → B(2), B(2) → B1(3)
        let h = Hierarchy::from_edges(
            &names(&["root", "A", "B", "B1"]),
            &[None, Some(10.0), None, Some(30.0)],
            &[0, 1, 0, 2, 2, 3],
        )
        .unwrap();

        assert_eq!(h.len(), 4);
        assert_eq!(h.node(h.root()).name, "root");
        assert_eq!(h.node(h.root()).value, 40.0);
        assert_eq!(h.height(), 2);
        let kids: Vec<&str> = h
            .children(h.root())
            .iter()
            .map(|&id| h.node(id).name.as_str())
            .collect();
        assert_eq!(kids, vec!["A", "B"]);
    }

    #[test]
    fn test_root_need_not_be_first() {
        // 2 is the root
        let h = Hierarchy::from_edges(
            &names(&["x", "y", "top"]),
            &[Some(1.0), Some(2.0), None],
            &[2, 0, 2, 1],
        )
        .unwrap();
        assert_eq!(h.node(h.root()).name, "top");
        assert_eq!(h.node(h.root()).value, 3.0);
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Hierarchy::from_edges(&names(&["a", "b", "c"]), &[], &[0, 1, 1, 2, 2, 0])
            .unwrap_err();
        assert!(
            matches!(err, HierarchyError::Cycle { .. }),
            "expected a cycle error, got {err:?}"
        );
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = Hierarchy::from_edges(&names(&["a", "b"]), &[], &[0, 0, 0, 1]).unwrap_err();
        assert_eq!(err, HierarchyError::Cycle { node: 0 });
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let err = Hierarchy::from_edges(&names(&["a", "b", "c", "d"]), &[], &[0, 1, 2, 3])
            .unwrap_err();
        assert_eq!(err, HierarchyError::MultipleRoots { roots: vec![0, 2] });
    }

    #[test]
    fn test_bad_edges_rejected() {
        let n = names(&["a", "b", "c"]);
        assert!(matches!(
            Hierarchy::from_edges(&n, &[], &[0, 1, 2]),
            Err(HierarchyError::InvalidEdges(_))
        ));
        assert_eq!(
            Hierarchy::from_edges(&n, &[], &[0, 999]).unwrap_err(),
            HierarchyError::UnknownNode { index: 999 }
        );
        assert!(matches!(
            Hierarchy::from_edges(&n, &[], &[0, 2, 1, 2]),
            Err(HierarchyError::InvalidEdges(_))
        ));
    }

    #[test]
    fn test_single_node_without_edges() {
        let h = Hierarchy::from_edges(&names(&["only"]), &[Some(5.0)], &[]).unwrap();
        assert_eq!(h.len(), 1);
        assert_eq!(h.node(h.root()).value, 5.0);
    }

    #[test]
    fn test_row_ids_map_to_named_nodes() {
        let rows = names(&["x", "y", "top"]);
        let (h, ids) =
            Hierarchy::stratify(&rows, &[Some(1.0), Some(2.0), None], &[2, 0, 2, 1]).unwrap();

        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId::ROOT]);
        for (row, &id) in ids.iter().enumerate() {
            assert_eq!(h.node(id).name, rows[row]);
        }
        assert_eq!(h.parent(ids[0]), Some(ids[2]));
    }

    #[test]
    fn test_empty_name_rejected_with_path() {
        let err = Hierarchy::from_edges(&names(&["root", ""]), &[], &[0, 1]).unwrap_err();
        assert_eq!(err, HierarchyError::EmptyName { path: "root/".into() });
    }

    #[test]
    fn test_long_chain_from_edges() {
        let n = 200_000u32;
        let rows: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut values = vec![None; n as usize];
        values[n as usize - 1] = Some(1.0);
        let edges: Vec<u32> = (0..n - 1).flat_map(|i| [i, i + 1]).collect();

        let (h, ids) = Hierarchy::stratify(&rows, &values, &edges).unwrap();
        assert_eq!(h.len(), n as usize);
        assert_eq!(h.height(), n - 1);
        assert_eq!(h.node(h.root()).value, 1.0);
        assert_eq!(h.node(ids[n as usize - 1]).depth, n - 1);
    }
}
