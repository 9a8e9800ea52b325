//! Sunburst zoom controller.
//!
//! Selecting an arc re-expresses every rectangle relative to it: the
//! selected node stretches to the full circle and moves to ring 0, so its
//! children fill ring 1. The center disc stands for the selected node's
//! parent; selecting it zooms back out one level.

use serde::{Deserialize, Serialize};

use crate::color::{ColorConfig, ColorMap};
use crate::error::ChartError;
use crate::hierarchy::{Hierarchy, NodeId, SiblingOrder};
use crate::layout::partition::{
    ArcShape, LabelPlacement, Rect, RingWindow, font_size, hit_test, partition,
};

use super::easing::{Interpolate, lerp};
use super::{ControllerState, Transition, ZoomOutcome};

impl Interpolate for Rect {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Rect {
            x0: lerp(self.x0, to.x0, t),
            x1: lerp(self.x1, to.x1, t),
            y0: lerp(self.y0, to.y0, t),
            y1: lerp(self.y1, to.y1, t),
        }
    }
}

/// Sunburst settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SunburstConfig {
    /// Canvas width and height in pixels.
    pub size: f64,
    /// Rings drawn around the center.
    pub ring_window: RingWindow,
    /// Minimum `thickness × span` for a label to be drawn.
    pub min_label_area: f64,
    /// Transition length in milliseconds.
    pub duration_ms: f64,
    /// Upper bound on the gap between neighbouring arcs (radians).
    pub pad_angle_max: f64,
    /// Largest label font size in pixels.
    pub max_font_size: f64,
    pub order: SiblingOrder,
    pub colors: ColorConfig,
}

impl Default for SunburstConfig {
    fn default() -> Self {
        Self {
            size: 960.0,
            ring_window: RingWindow::default(),
            min_label_area: 0.03,
            duration_ms: 750.0,
            pad_angle_max: 0.005,
            max_font_size: 14.0,
            order: SiblingOrder::ByValue,
            colors: ColorConfig::default(),
        }
    }
}

impl SunburstConfig {
    /// Pixel width of one ring.
    pub fn radius(&self) -> f64 {
        self.size.max(0.0) / 6.0
    }
}

/// Render data for one arc.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcFrame {
    pub id: NodeId,
    pub name: String,
    pub color: String,
    /// Geometry this frame, in radians and ring units.
    pub rect: Rect,
    pub arc: ArcShape,
    pub label_placement: LabelPlacement,
    pub font_size: f64,
    pub opacity: f64,
    pub label_opacity: f64,
    /// Whether selecting the arc zooms.
    pub interactive: bool,
}

/// The center disc.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterFrame {
    /// Node the disc zooms out to.
    pub id: NodeId,
    /// Path from the root to the displayed node, e.g. `flare/vis/axes`.
    pub label: String,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunburstFrame {
    /// Every node except the root, in pre-order.
    pub nodes: Vec<ArcFrame>,
    pub center: CenterFrame,
    pub radius: f64,
}

/// Zoomable sunburst state.
#[derive(Debug)]
pub struct SunburstZoom {
    hierarchy: Hierarchy,
    colors: ColorMap,
    config: SunburstConfig,
    /// Resting partition, unaffected by zoom.
    layout: Vec<Rect>,
    current: Vec<Rect>,
    target: Vec<Rect>,
    transition: Option<Transition<Vec<Rect>>>,
    /// Node displayed at the center.
    focus: NodeId,
    /// Node the center disc zooms out to.
    center: NodeId,
}

impl SunburstZoom {
    /// Build the controller at rest on the root.
    ///
    /// The hierarchy is sorted with `config.order`; `colors` must come from
    /// the same hierarchy.
    pub fn new(mut hierarchy: Hierarchy, colors: ColorMap, config: SunburstConfig) -> Self {
        hierarchy.sort(config.order);
        let layout = partition(&hierarchy);
        let root = hierarchy.root();
        log::debug!(
            "sunburst ready: {} nodes, radius {}",
            hierarchy.len(),
            config.radius()
        );
        Self {
            hierarchy,
            colors,
            config,
            current: layout.clone(),
            target: layout.clone(),
            layout,
            transition: None,
            focus: root,
            center: root,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn config(&self) -> &SunburstConfig {
        &self.config
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn center(&self) -> NodeId {
        self.center
    }

    /// Geometry drawn this frame, indexed by [`NodeId`].
    pub fn current(&self) -> &[Rect] {
        &self.current
    }

    /// Geometry the running transition ends at.
    pub fn target(&self) -> &[Rect] {
        &self.target
    }

    pub fn state(&self) -> ControllerState {
        if self.transition.is_some() {
            ControllerState::Animating
        } else {
            ControllerState::Idle
        }
    }

    /// Zoom into `id`.
    ///
    /// Leaves and arcs outside the ring window are not click targets.
    pub fn select_node(&mut self, id: NodeId, now: f64) -> Result<ZoomOutcome, ChartError> {
        if !self.hierarchy.contains(id) {
            return Err(ChartError::UnknownNode(id));
        }
        if self.hierarchy.node(id).is_leaf() {
            return Ok(ZoomOutcome::Ignored);
        }
        if !self.config.ring_window.arc_visible(&self.target[id.index()]) {
            return Ok(ZoomOutcome::Ignored);
        }
        self.zoom_to(id, now);
        Ok(ZoomOutcome::Started)
    }

    /// Zoom out to the center node. A no-op at the root.
    pub fn select_center(&mut self, now: f64) -> ZoomOutcome {
        if self.focus == self.hierarchy.root() {
            return ZoomOutcome::Ignored;
        }
        self.zoom_to(self.center, now);
        ZoomOutcome::Started
    }

    fn zoom_to(&mut self, p: NodeId, now: f64) {
        let focus_rect = self.layout[p.index()];
        let depth = self.hierarchy.node(p).depth;
        let target: Vec<Rect> = self
            .layout
            .iter()
            .map(|r| r.relative_to(&focus_rect, depth))
            .collect();

        // Pick up from wherever an in-flight zoom has got to.
        if let Some(running) = &self.transition {
            self.current = running.sample(now);
        }
        self.transition = Some(Transition::new(
            self.current.clone(),
            target.clone(),
            now,
            self.config.duration_ms,
        ));
        self.target = target;
        self.focus = p;
        self.center = self.hierarchy.parent(p).unwrap_or(self.hierarchy.root());
        log::debug!(
            "zoom to {} ({}), center {}",
            p,
            self.hierarchy.node(p).name,
            self.center
        );
    }

    /// Advance the running transition to `now`.
    pub fn tick(&mut self, now: f64) -> ControllerState {
        let Some(running) = &self.transition else {
            return ControllerState::Idle;
        };
        self.current = running.sample(now);
        if running.is_finished(now) {
            self.transition = None;
            log::trace!("zoom finished at {}", now);
            return ControllerState::Idle;
        }
        ControllerState::Animating
    }

    /// Change the sibling order. Geometry snaps to the new layout at the
    /// current zoom; colors are kept.
    pub fn set_order(&mut self, order: SiblingOrder) {
        self.hierarchy.sort(order);
        self.config.order = order;
        self.layout = partition(&self.hierarchy);
        let focus_rect = self.layout[self.focus.index()];
        let depth = self.hierarchy.node(self.focus).depth;
        self.target = self
            .layout
            .iter()
            .map(|r| r.relative_to(&focus_rect, depth))
            .collect();
        self.current = self.target.clone();
        self.transition = None;
    }

    /// Arc under a point given relative to the chart center.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        hit_test(
            &self.current,
            &self.config.ring_window,
            self.config.radius(),
            x,
            y,
        )
        .filter(|id| self.is_interactive(*id))
    }

    fn is_interactive(&self, id: NodeId) -> bool {
        !self.hierarchy.node(id).is_leaf()
            && self.config.ring_window.arc_visible(&self.target[id.index()])
    }

    /// Render data for the current frame.
    ///
    /// Visibility follows the target so arcs fade while they move;
    /// geometry follows the current frame.
    pub fn frame(&self) -> SunburstFrame {
        let radius = self.config.radius();
        let window = &self.config.ring_window;
        let nodes = self
            .hierarchy
            .descendants()
            .into_iter()
            .skip(1)
            .map(|id| {
                let node = self.hierarchy.node(id);
                let current = &self.current[id.index()];
                let target = &self.target[id.index()];
                ArcFrame {
                    id,
                    name: node.name.clone(),
                    color: self.colors.get(id).to_string(),
                    rect: *current,
                    arc: ArcShape::new(current, radius, self.config.pad_angle_max),
                    label_placement: LabelPlacement::new(current, radius),
                    font_size: font_size(target, radius, self.config.max_font_size),
                    opacity: if window.arc_visible(target) { 1.0 } else { 0.0 },
                    label_opacity: if window.label_visible(target, self.config.min_label_area) {
                        1.0
                    } else {
                        0.0
                    },
                    interactive: self.is_interactive(id),
                }
            })
            .collect();

        SunburstFrame {
            nodes,
            center: CenterFrame {
                id: self.center,
                label: self.hierarchy.path_label(self.focus, "/"),
                clickable: self.focus != self.hierarchy.root(),
            },
            radius,
        }
    }
}
