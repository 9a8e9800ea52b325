//! Tree diagram controller.
//!
//! The diagram moves between layouts rather than zooming: every switch of
//! projection or arrangement computes a new layout and animates each node
//! from where it is drawn now. On the first switch nodes grow out of an
//! entry point at the left edge and fade in.

use serde::Serialize;

use crate::color::{ColorConfig, ColorMap, assign_colors};
use crate::error::ChartError;
use crate::hierarchy::{Hierarchy, NodeId};
use crate::layout::measure::{LabelMeasure, LabelMetrics};
use crate::layout::tree::{
    Arrangement, Projection, TreeConfig, TreeLayout, TreePoint, TreeViewport, layout_tree_measured,
};
use std::cell::{Cell, RefCell};

use crate::spatial::{NodePoint, SpatialIndex};

use super::easing::{Interpolate, lerp};
use super::{ControllerState, Transition, ZoomOutcome};

/// Which layout the diagram shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeLayoutState {
    /// Nothing laid out yet.
    Uninitialized,
    /// Linear projection, growing left to right.
    Tidy(Arrangement),
    /// Radial projection around the canvas center.
    Radial(Arrangement),
}

impl TreeLayoutState {
    pub fn projection(self) -> Option<Projection> {
        match self {
            TreeLayoutState::Uninitialized => None,
            TreeLayoutState::Tidy(_) => Some(Projection::Linear),
            TreeLayoutState::Radial(_) => Some(Projection::Radial),
        }
    }

    pub fn arrangement(self) -> Option<Arrangement> {
        match self {
            TreeLayoutState::Uninitialized => None,
            TreeLayoutState::Tidy(a) | TreeLayoutState::Radial(a) => Some(a),
        }
    }
}

/// One node as drawn: its position and opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePose {
    pub point: TreePoint,
    pub opacity: f64,
}

impl Interpolate for TreePose {
    /// Polar between two radial points, otherwise along a straight line.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        let point = match (self.point, to.point) {
            (
                TreePoint::Radial { angle: a0, radius: r0 },
                TreePoint::Radial { angle: a1, radius: r1 },
            ) => TreePoint::Radial {
                angle: lerp(a0, a1, t),
                radius: lerp(r0, r1, t),
            },
            (TreePoint::Linear { x: x0, y: y0 }, TreePoint::Linear { x: x1, y: y1 }) => {
                TreePoint::Linear {
                    x: lerp(x0, x1, t),
                    y: lerp(y0, y1, t),
                }
            }
            (from, to) => {
                let (fx, fy) = from.to_cartesian();
                let (tx, ty) = to.to_cartesian();
                // Linear points draw at (y, x).
                TreePoint::Linear {
                    x: lerp(fy, ty, t),
                    y: lerp(fx, tx, t),
                }
            }
        };
        TreePose {
            point,
            opacity: lerp(self.opacity, to.opacity, t),
        }
    }
}

impl Interpolate for TreeViewport {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        TreeViewport {
            translate_x: lerp(self.translate_x, to.translate_x, t),
            translate_y: lerp(self.translate_y, to.translate_y, t),
            width: lerp(self.width, to.width, t),
            height: lerp(self.height, to.height, t),
        }
    }
}

/// Everything that animates between two tree layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeScene {
    pub poses: Vec<TreePose>,
    pub viewport: TreeViewport,
}

impl Interpolate for TreeScene {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        TreeScene {
            poses: self.poses.interpolate(&to.poses, t),
            viewport: self.viewport.interpolate(&to.viewport, t),
        }
    }
}

/// Render data for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeFrame {
    pub id: NodeId,
    pub name: String,
    pub color: String,
    /// Position in projection coordinates.
    pub point: TreePoint,
    /// Canvas position, viewport offset included.
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    /// Internal nodes draw a filled circle and a label to the left.
    pub has_children: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLinkFrame {
    pub source: NodeId,
    pub target: NodeId,
    /// Links take the color of their child node.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFrame {
    pub state: TreeLayoutState,
    pub nodes: Vec<TreeNodeFrame>,
    pub links: Vec<TreeLinkFrame>,
    pub viewport: TreeViewport,
}

/// Tree diagram state.
pub struct TreeController {
    hierarchy: Hierarchy,
    colors: ColorMap,
    config: TreeConfig,
    measure: Box<dyn LabelMeasure>,
    state: TreeLayoutState,
    /// Label metrics from the first layout.
    metrics: Option<LabelMetrics>,
    layout: Option<TreeLayout>,
    current: TreeScene,
    transition: Option<Transition<TreeScene>>,
    /// Hit-test index over `current`, rebuilt on the first query after the
    /// scene moves.
    index: RefCell<SpatialIndex>,
    index_stale: Cell<bool>,
}

impl std::fmt::Debug for TreeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeController")
            .field("nodes", &self.hierarchy.len())
            .field("state", &self.state)
            .field("metrics", &self.metrics)
            .field("animating", &self.transition.is_some())
            .finish()
    }
}

impl TreeController {
    /// Build an uninitialized controller; call [`show_tidy`](Self::show_tidy)
    /// or [`show_radial`](Self::show_radial) to lay the tree out.
    ///
    /// Colors are flat per branch, as in the sunburst but without shading,
    /// and are computed from input order so they never depend on the layout.
    pub fn new(hierarchy: Hierarchy, config: TreeConfig, measure: Box<dyn LabelMeasure>) -> Self {
        let colors = assign_colors(&hierarchy, &Self::color_config(), None);
        Self::with_colors(hierarchy, colors, config, measure)
    }

    /// Flat branch colors, no depth shading.
    pub fn color_config() -> ColorConfig {
        ColorConfig {
            shade_by_depth: false,
            ..ColorConfig::default()
        }
    }

    /// Build with a precomputed color map for the same hierarchy.
    pub fn with_colors(
        mut hierarchy: Hierarchy,
        colors: ColorMap,
        config: TreeConfig,
        measure: Box<dyn LabelMeasure>,
    ) -> Self {
        hierarchy.sort(config.order);
        let current = Self::entry_scene(hierarchy.len(), config.size);
        Self {
            hierarchy,
            colors,
            config,
            measure,
            state: TreeLayoutState::Uninitialized,
            metrics: None,
            layout: None,
            current,
            transition: None,
            index: RefCell::new(SpatialIndex::new()),
            index_stale: Cell::new(true),
        }
    }

    /// Every node at the left edge, halfway down, invisible.
    fn entry_scene(len: usize, size: f64) -> TreeScene {
        let entry = TreePose {
            point: TreePoint::Linear {
                x: size / 2.0,
                y: 0.0,
            },
            opacity: 0.0,
        };
        TreeScene {
            poses: vec![entry; len],
            viewport: TreeViewport::default(),
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn layout_state(&self) -> TreeLayoutState {
        self.state
    }

    /// The layout being shown or animated toward.
    pub fn layout(&self) -> Option<&TreeLayout> {
        self.layout.as_ref()
    }

    pub fn current(&self) -> &TreeScene {
        &self.current
    }

    pub fn state(&self) -> ControllerState {
        if self.transition.is_some() {
            ControllerState::Animating
        } else {
            ControllerState::Idle
        }
    }

    /// Switch to the linear tidy tree.
    pub fn show_tidy(&mut self, now: f64) {
        self.transition_to(TreeLayoutState::Tidy(Arrangement::Tidy), now);
    }

    /// Switch to the radial tidy tree.
    pub fn show_radial(&mut self, now: f64) {
        self.transition_to(TreeLayoutState::Radial(Arrangement::Tidy), now);
    }

    /// Flip between tidy and cluster arrangement, keeping the projection.
    pub fn toggle_cluster(&mut self, now: f64) {
        let next = match self.state {
            TreeLayoutState::Uninitialized => TreeLayoutState::Tidy(Arrangement::Cluster),
            TreeLayoutState::Tidy(a) => TreeLayoutState::Tidy(a.toggled()),
            TreeLayoutState::Radial(a) => TreeLayoutState::Radial(a.toggled()),
        };
        self.transition_to(next, now);
    }

    /// Tree nodes do not zoom.
    pub fn select_node(&self, id: NodeId) -> Result<ZoomOutcome, ChartError> {
        if !self.hierarchy.contains(id) {
            return Err(ChartError::UnknownNode(id));
        }
        Ok(ZoomOutcome::Ignored)
    }

    fn transition_to(&mut self, next: TreeLayoutState, now: f64) {
        let (Some(projection), Some(arrangement)) = (next.projection(), next.arrangement()) else {
            return;
        };
        let layout = layout_tree_measured(
            &self.hierarchy,
            arrangement,
            projection,
            &self.config,
            self.measure.as_ref(),
            self.metrics,
        );
        self.metrics = Some(layout.metrics);

        let target = TreeScene {
            poses: layout
                .points
                .iter()
                .map(|&point| TreePose {
                    point,
                    opacity: 1.0,
                })
                .collect(),
            viewport: layout.viewport,
        };

        if let Some(running) = &self.transition {
            self.current = running.sample(now);
        }
        self.transition = Some(Transition::new(
            self.current.clone(),
            target,
            now,
            self.config.duration_ms,
        ));
        self.layout = Some(layout);
        log::debug!("tree layout {:?} -> {:?}", self.state, next);
        self.state = next;
        self.index_stale.set(true);
    }

    /// Advance the running transition to `now`.
    pub fn tick(&mut self, now: f64) -> ControllerState {
        let Some(running) = &self.transition else {
            return ControllerState::Idle;
        };
        self.current = running.sample(now);
        let finished = running.is_finished(now);
        if finished {
            self.transition = None;
        }
        self.index_stale.set(true);
        if finished {
            ControllerState::Idle
        } else {
            ControllerState::Animating
        }
    }

    fn canvas_position(&self, pose: &TreePose) -> (f64, f64) {
        let (x, y) = pose.point.to_cartesian();
        (
            x + self.current.viewport.translate_x,
            y + self.current.viewport.translate_y,
        )
    }

    /// Run a query against the spatial index, rebuilding it first if the
    /// scene has moved since the last query.
    fn with_index<R>(&self, query: impl FnOnce(&SpatialIndex) -> R) -> R {
        if self.index_stale.replace(false) {
            let points = self.current.poses.iter().enumerate().map(|(i, pose)| {
                let (x, y) = self.canvas_position(pose);
                NodePoint::new(NodeId(i as u32), x, y)
            });
            self.index.borrow_mut().rebuild(points);
        }
        query(&self.index.borrow())
    }

    /// Canvas positions `[x0, y0, x1, y1, ...]` indexed by [`NodeId`].
    pub fn positions(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.current.poses.len() * 2);
        for pose in &self.current.poses {
            let (x, y) = self.canvas_position(pose);
            out.push(x);
            out.push(y);
        }
        out
    }

    /// Node drawn within `radius` pixels of a canvas point.
    pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<NodeId> {
        if self.state == TreeLayoutState::Uninitialized {
            return None;
        }
        self.with_index(|index| index.nearest_within(x, y, radius))
    }

    /// Node drawn closest to a canvas point, at any distance.
    pub fn nearest_node(&self, x: f64, y: f64) -> Option<NodeId> {
        if self.state == TreeLayoutState::Uninitialized {
            return None;
        }
        self.with_index(|index| index.nearest(x, y))
    }

    /// Nodes drawn inside a canvas rectangle.
    pub fn nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<NodeId> {
        if self.state == TreeLayoutState::Uninitialized {
            return Vec::new();
        }
        self.with_index(|index| index.in_rect(min_x, min_y, max_x, max_y))
    }

    /// The node and its ancestors, for hover highlighting.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, ChartError> {
        if !self.hierarchy.contains(id) {
            return Err(ChartError::UnknownNode(id));
        }
        Ok(self.hierarchy.ancestors(id))
    }

    /// Render data for the current frame.
    pub fn frame(&self) -> TreeFrame {
        let nodes = self
            .hierarchy
            .descendants()
            .into_iter()
            .map(|id| {
                let node = self.hierarchy.node(id);
                let pose = &self.current.poses[id.index()];
                let (x, y) = self.canvas_position(pose);
                TreeNodeFrame {
                    id,
                    name: node.name.clone(),
                    color: self.colors.get(id).to_string(),
                    point: pose.point,
                    x,
                    y,
                    opacity: pose.opacity,
                    has_children: !node.is_leaf(),
                }
            })
            .collect();

        let links = self
            .hierarchy
            .links()
            .into_iter()
            .map(|(source, target)| TreeLinkFrame {
                source,
                target,
                color: self.colors.get(target).to_string(),
            })
            .collect();

        TreeFrame {
            state: self.state,
            nodes,
            links,
            viewport: self.current.viewport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Record;
    use crate::layout::measure::CharWidthMeasure;
    use std::rc::Rc;

    const EPS: f64 = 1e-9;

    fn record() -> Record {
        Record::branch(
            "flare",
            vec![
                Record::branch(
                    "analytics",
                    vec![Record::leaf("cluster", 3.0), Record::leaf("graph", 4.0)],
                ),
                Record::branch("vis", vec![Record::leaf("axes", 1.0)]),
                Record::leaf("data", 2.0),
            ],
        )
    }

    fn controller() -> TreeController {
        TreeController::new(
            Hierarchy::build(&record()).unwrap(),
            TreeConfig::default(),
            Box::new(CharWidthMeasure::default()),
        )
    }

    #[test]
    fn test_starts_uninitialized_at_entry_point() {
        let c = controller();
        assert_eq!(c.layout_state(), TreeLayoutState::Uninitialized);
        assert_eq!(c.state(), ControllerState::Idle);
        let frame = c.frame();
        for node in &frame.nodes {
            assert_eq!((node.x, node.y), (0.0, 480.0));
            assert_eq!(node.opacity, 0.0);
        }
        assert_eq!(c.node_at(0.0, 480.0, 5.0), None);
    }

    #[test]
    fn test_show_tidy_fades_in_and_lands_on_layout() {
        let mut c = controller();
        c.show_tidy(0.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Tidy(Arrangement::Tidy));
        assert_eq!(c.state(), ControllerState::Animating);

        assert_eq!(c.tick(500.0), ControllerState::Animating);
        let halfway = c.frame().nodes[0].opacity;
        assert!((halfway - 0.5).abs() < EPS, "opacity {halfway}");

        assert_eq!(c.tick(1000.0), ControllerState::Idle);
        let layout = c.layout().unwrap().clone();
        let frame = c.frame();
        assert_eq!(frame.viewport, layout.viewport);
        for node in &frame.nodes {
            assert_eq!(node.opacity, 1.0);
            assert_eq!(node.point, layout.points[node.id.index()]);
            let (x, y) = node.point.to_cartesian();
            assert_eq!(node.x, x + layout.viewport.translate_x);
            assert_eq!(node.y, y + layout.viewport.translate_y);
        }
        assert_eq!(frame.links.len(), c.hierarchy().len() - 1);
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut c = controller();
        c.toggle_cluster(0.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Tidy(Arrangement::Cluster));
        c.show_radial(100.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Radial(Arrangement::Tidy));
        c.toggle_cluster(200.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Radial(Arrangement::Cluster));
        c.toggle_cluster(300.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Radial(Arrangement::Tidy));
        c.show_tidy(400.0);
        assert_eq!(c.layout_state(), TreeLayoutState::Tidy(Arrangement::Tidy));
        assert_eq!(c.tick(1400.0), ControllerState::Idle);
    }

    #[test]
    fn test_labels_measured_once() {
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let measure = move |label: &str| {
            counter.set(counter.get() + 1);
            label.len() as f64 * 6.0
        };
        let mut c = TreeController::new(
            Hierarchy::build(&record()).unwrap(),
            TreeConfig::default(),
            Box::new(measure),
        );
        c.show_tidy(0.0);
        let after_first = calls.get();
        assert_eq!(after_first, c.hierarchy().len());
        c.show_radial(10.0);
        c.toggle_cluster(20.0);
        assert_eq!(calls.get(), after_first, "later layouts reuse the cached width");
    }

    #[test]
    fn test_supersede_from_in_flight_scene() {
        let mut c = controller();
        c.show_tidy(0.0);
        c.tick(1000.0);
        c.show_radial(1000.0);
        c.tick(1300.0);
        let mid = c.current().clone();

        c.toggle_cluster(1300.0);
        c.tick(1300.0);
        assert_eq!(c.current().poses.len(), mid.poses.len());
        for (a, b) in c.current().poses.iter().zip(&mid.poses) {
            let (ax, ay) = a.point.to_cartesian();
            let (bx, by) = b.point.to_cartesian();
            assert!((ax - bx).abs() < 1e-6 && (ay - by).abs() < 1e-6);
        }
        assert_eq!(c.tick(2300.0), ControllerState::Idle);
        assert_eq!(c.layout_state(), TreeLayoutState::Radial(Arrangement::Cluster));
    }

    #[test]
    fn test_radial_to_radial_interpolates_in_polar() {
        let from = TreePose {
            point: TreePoint::Radial { angle: 0.0, radius: 100.0 },
            opacity: 1.0,
        };
        let to = TreePose {
            point: TreePoint::Radial {
                angle: std::f64::consts::PI,
                radius: 100.0,
            },
            opacity: 1.0,
        };
        let mid = from.interpolate(&to, 0.5);
        let (x, y) = mid.point.to_cartesian();
        // Swings around the arc instead of cutting through the center.
        assert!((x - 100.0).abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn test_mixed_projection_interpolates_on_canvas() {
        let from = TreePose {
            point: TreePoint::Linear { x: 0.0, y: 0.0 },
            opacity: 0.0,
        };
        let to = TreePose {
            point: TreePoint::Radial { angle: 0.0, radius: 10.0 },
            opacity: 1.0,
        };
        let mid = from.interpolate(&to, 0.5);
        let (x, y) = mid.point.to_cartesian();
        assert!(x.abs() < EPS && (y + 5.0).abs() < EPS);
        assert_eq!(mid.opacity, 0.5);
    }

    #[test]
    fn test_colors_stable_across_layouts() {
        let mut c = controller();
        let colors = |c: &TreeController| -> Vec<(NodeId, String)> {
            let mut v: Vec<_> = c.frame().nodes.into_iter().map(|n| (n.id, n.color)).collect();
            v.sort_by_key(|(id, _)| *id);
            v
        };
        c.show_tidy(0.0);
        c.tick(1000.0);
        let tidy = colors(&c);
        c.show_radial(1000.0);
        c.tick(2000.0);
        assert_eq!(colors(&c), tidy);
        c.toggle_cluster(2000.0);
        c.tick(3000.0);
        assert_eq!(colors(&c), tidy);

        // Every node shares its branch head's color.
        let h = c.hierarchy();
        for id in h.ids().skip(1) {
            let head = h.branch_of(id).unwrap();
            assert_eq!(c.colors().get(id), c.colors().get(head));
        }
    }

    #[test]
    fn test_hit_testing_and_hover_path() {
        let mut c = controller();
        c.show_tidy(0.0);
        c.tick(1000.0);
        let target = c.frame().nodes.into_iter().find(|n| n.name == "axes").unwrap();
        assert_eq!(c.node_at(target.x + 1.0, target.y - 1.0, 4.0), Some(target.id));
        assert_eq!(c.node_at(-500.0, -500.0, 4.0), None);

        let path: Vec<String> = c
            .ancestors(target.id)
            .unwrap()
            .into_iter()
            .map(|id| c.hierarchy().node(id).name.clone())
            .collect();
        assert_eq!(path, vec!["axes", "vis", "flare"]);
        assert_eq!(c.select_node(target.id).unwrap(), ZoomOutcome::Ignored);
        assert!(c.ancestors(NodeId(42)).is_err());

        let all = c.nodes_in_rect(-1e6, -1e6, 1e6, 1e6);
        assert_eq!(all.len(), c.hierarchy().len());
        assert_eq!(c.nearest_node(target.x + 30.0, target.y), Some(target.id));
    }

    #[test]
    fn test_hit_index_follows_the_scene_lazily() {
        let mut c = controller();
        c.show_tidy(0.0);
        c.tick(1000.0);
        let tidy = c.frame().nodes.into_iter().find(|n| n.name == "axes").unwrap();
        assert_eq!(c.node_at(tidy.x, tidy.y, 1.0), Some(tidy.id));
        assert!(!c.index_stale.get());

        // Ticks only mark the index; the next query sees the new positions.
        c.show_radial(1000.0);
        for step in 1..=10 {
            c.tick(1000.0 + step as f64 * 100.0);
            assert!(c.index_stale.get());
        }
        let radial = c.frame().nodes.into_iter().find(|n| n.name == "axes").unwrap();
        assert!((radial.x - tidy.x).abs() + (radial.y - tidy.y).abs() > 1.0);
        assert_eq!(c.node_at(radial.x, radial.y, 1.0), Some(radial.id));
        assert!(!c.index_stale.get());
        assert_eq!(c.nearest_node(radial.x, radial.y), Some(radial.id));
    }
}
