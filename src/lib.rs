//! Sunburst Tree - WASM Module
//!
//! Layout and animation core for two hierarchy charts: a zoomable sunburst
//! and a tree diagram with tidy/cluster arrangements in linear or radial
//! projection. It is compiled to WebAssembly and exposes a JavaScript-friendly
//! API via wasm-bindgen; the host draws the frames it returns.
//!
//! # Architecture
//!
//! - `hierarchy`: Arena tree built from nested records or an edge list
//! - `color`: Branch hue assignment
//! - `layout`: Partition, tidy tree and cluster layouts
//! - `transition`: Zoom and layout-switch controllers
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing

use js_sys::{Float64Array, Function, Uint32Array};
use log::Level;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub mod color;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod spatial;
pub mod transition;

use color::{ColorConfig, ColorMap, assign_colors};
use error::ChartError;
use hierarchy::{Hierarchy, NodeId, Record, SiblingOrder};
use layout::{CharWidthMeasure, LabelMeasure, TreeConfig};
use transition::{ControllerState, SunburstConfig, SunburstZoom, TreeController, ZoomOutcome};

/// Initialize the WASM module: console logging and panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
    log::info!("sunburst-tree wasm initialized");
}

// =============================================================================
// JS boundary helpers
// =============================================================================

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, ChartError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ChartError::Decode(e.to_string()))
}

/// Decode an optional config object; `undefined` and `null` mean defaults.
fn decode_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, ChartError> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        decode(value)
    }
}

/// Parallel name/value arrays plus edge pairs into a hierarchy, with the
/// node id of every input row. `NaN` values stand for "no value".
fn stratify(
    names: Vec<String>,
    values: &[f64],
    edges: &[u32],
) -> Result<(Hierarchy, Vec<NodeId>), ChartError> {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(v) })
        .collect();
    Ok(Hierarchy::stratify(&names, &values, edges)?)
}

/// Nested input is numbered in pre-order, so row `i` is node `i`.
fn pre_order_ids(hierarchy: &Hierarchy) -> Vec<NodeId> {
    hierarchy.ids().collect()
}

fn node_id_of(ids: &[NodeId], row: u32) -> Option<u32> {
    ids.get(row as usize).map(|id| id.0)
}

fn node_id_table(ids: &[NodeId]) -> Uint32Array {
    let raw: Vec<u32> = ids.iter().map(|id| id.0).collect();
    Uint32Array::from(&raw[..])
}

/// Label widths measured by a JS callback `(label) => number`.
struct JsMeasure(Function);

impl LabelMeasure for JsMeasure {
    fn measure(&self, label: &str) -> f64 {
        self.0
            .call1(&JsValue::NULL, &JsValue::from_str(label))
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(f64::NAN)
    }
}

/// Top-level branch colors from a JS callback `(name) => string | undefined`.
fn colors_with(hierarchy: &Hierarchy, config: &ColorConfig, color_fn: Option<Function>) -> ColorMap {
    match color_fn {
        Some(f) => {
            let lookup = move |name: &str| {
                f.call1(&JsValue::NULL, &JsValue::from_str(name))
                    .ok()
                    .and_then(|color| color.as_string())
            };
            assign_colors(hierarchy, config, Some(&lookup))
        }
        None => assign_colors(hierarchy, config, None),
    }
}

// =============================================================================
// Sunburst
// =============================================================================

/// Zoomable sunburst chart.
#[wasm_bindgen]
pub struct SunburstChart {
    zoom: SunburstZoom,
    /// Node id of every input row.
    ids: Vec<NodeId>,
}

impl SunburstChart {
    fn from_hierarchy(
        hierarchy: Hierarchy,
        ids: Vec<NodeId>,
        config: JsValue,
        color_fn: Option<Function>,
    ) -> Result<SunburstChart, ChartError> {
        let config: SunburstConfig = decode_or_default(config)?;
        let colors = colors_with(&hierarchy, &config.colors, color_fn);
        Ok(Self {
            zoom: SunburstZoom::new(hierarchy, colors, config),
            ids,
        })
    }
}

#[wasm_bindgen]
impl SunburstChart {
    /// Build a chart from a nested `{ name, value?, children? }` record.
    ///
    /// # Arguments
    ///
    /// * `data` - Root record
    /// * `config` - Partial `SunburstConfig`, or undefined for defaults
    /// * `color_fn` - Optional `(branchName) => cssColor` override
    #[wasm_bindgen(constructor)]
    pub fn new(
        data: JsValue,
        config: JsValue,
        color_fn: Option<Function>,
    ) -> Result<SunburstChart, JsError> {
        let record: Record = decode(data)?;
        let hierarchy = Hierarchy::build(&record).map_err(ChartError::from)?;
        let ids = pre_order_ids(&hierarchy);
        Ok(Self::from_hierarchy(hierarchy, ids, config, color_fn)?)
    }

    /// Build a chart from node names, values (`NaN` for none) and
    /// `[parent0, child0, parent1, child1, ...]` edge pairs.
    ///
    /// Node ids are assigned in pre-order; map rows with `nodeIdOf`.
    #[wasm_bindgen(js_name = fromEdges)]
    pub fn from_edges(
        names: Vec<String>,
        values: &[f64],
        edges: &[u32],
        config: JsValue,
        color_fn: Option<Function>,
    ) -> Result<SunburstChart, JsError> {
        let (hierarchy, ids) = stratify(names, values, edges)?;
        Ok(Self::from_hierarchy(hierarchy, ids, config, color_fn)?)
    }

    /// Node id of an input row, or undefined for an unknown row.
    #[wasm_bindgen(js_name = nodeIdOf)]
    pub fn node_id_of(&self, row: u32) -> Option<u32> {
        node_id_of(&self.ids, row)
    }

    /// Node id of every input row, indexed by row.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Uint32Array {
        node_id_table(&self.ids)
    }

    /// Zoom into a node. Returns false when the node is not a zoom target.
    #[wasm_bindgen(js_name = selectNode)]
    pub fn select_node(&mut self, node_id: u32, now: f64) -> Result<bool, JsError> {
        let outcome = self.zoom.select_node(NodeId(node_id), now)?;
        Ok(outcome == ZoomOutcome::Started)
    }

    /// Zoom out one level. Returns false at the root.
    #[wasm_bindgen(js_name = selectCenter)]
    pub fn select_center(&mut self, now: f64) -> bool {
        self.zoom.select_center(now) == ZoomOutcome::Started
    }

    /// Advance the animation. Returns true while more frames follow.
    pub fn tick(&mut self, now: f64) -> bool {
        self.zoom.tick(now) == ControllerState::Animating
    }

    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> bool {
        self.zoom.state() == ControllerState::Animating
    }

    /// Render data for the current frame.
    pub fn frame(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.zoom.frame())?)
    }

    /// Current rectangles as `[x0, x1, y0, y1, ...]`, one group per node ID.
    #[wasm_bindgen(js_name = currentRects)]
    pub fn current_rects(&self) -> Float64Array {
        let rects = self.zoom.current();
        let mut flat = Vec::with_capacity(rects.len() * 4);
        for r in rects {
            flat.extend_from_slice(&[r.x0, r.x1, r.y0, r.y1]);
        }
        Float64Array::from(&flat[..])
    }

    /// Clickable arc under a canvas point.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f64, y: f64) -> Option<u32> {
        let half = self.zoom.config().size / 2.0;
        self.zoom.node_at(x - half, y - half).map(|id| id.0)
    }

    /// Reorder siblings: `"input"`, `"byHeight"` or `"byValue"`.
    #[wasm_bindgen(js_name = setOrder)]
    pub fn set_order(&mut self, order: JsValue) -> Result<(), JsError> {
        let order: SiblingOrder = decode(order)?;
        self.zoom.set_order(order);
        Ok(())
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.zoom.hierarchy().len() as u32
    }
}

// =============================================================================
// Tree diagram
// =============================================================================

/// Tree diagram with tidy/cluster arrangements and linear/radial projections.
#[wasm_bindgen]
pub struct TreeChart {
    controller: TreeController,
    /// Node id of every input row.
    ids: Vec<NodeId>,
}

impl TreeChart {
    fn from_hierarchy(
        hierarchy: Hierarchy,
        ids: Vec<NodeId>,
        config: JsValue,
        measure: Option<Function>,
        color_fn: Option<Function>,
    ) -> Result<TreeChart, ChartError> {
        let config: TreeConfig = decode_or_default(config)?;
        let measure: Box<dyn LabelMeasure> = match measure {
            Some(f) => Box::new(JsMeasure(f)),
            None => Box::new(CharWidthMeasure::default()),
        };
        let colors = colors_with(&hierarchy, &TreeController::color_config(), color_fn);
        Ok(Self {
            controller: TreeController::with_colors(hierarchy, colors, config, measure),
            ids,
        })
    }
}

#[wasm_bindgen]
impl TreeChart {
    /// Build a chart from a nested record.
    ///
    /// # Arguments
    ///
    /// * `data` - Root record
    /// * `config` - Partial `TreeConfig`, or undefined for defaults
    /// * `measure` - Optional `(label) => widthPx`; a 6 px per character
    ///   estimate is used without it
    /// * `color_fn` - Optional `(branchName) => cssColor` override
    #[wasm_bindgen(constructor)]
    pub fn new(
        data: JsValue,
        config: JsValue,
        measure: Option<Function>,
        color_fn: Option<Function>,
    ) -> Result<TreeChart, JsError> {
        let record: Record = decode(data)?;
        let hierarchy = Hierarchy::build(&record).map_err(ChartError::from)?;
        let ids = pre_order_ids(&hierarchy);
        Ok(Self::from_hierarchy(hierarchy, ids, config, measure, color_fn)?)
    }

    /// Build a chart from names, values and edge pairs, like
    /// `SunburstChart.fromEdges`.
    #[wasm_bindgen(js_name = fromEdges)]
    pub fn from_edges(
        names: Vec<String>,
        values: &[f64],
        edges: &[u32],
        config: JsValue,
        measure: Option<Function>,
        color_fn: Option<Function>,
    ) -> Result<TreeChart, JsError> {
        let (hierarchy, ids) = stratify(names, values, edges)?;
        Ok(Self::from_hierarchy(hierarchy, ids, config, measure, color_fn)?)
    }

    /// Node id of an input row, or undefined for an unknown row.
    #[wasm_bindgen(js_name = nodeIdOf)]
    pub fn node_id_of(&self, row: u32) -> Option<u32> {
        node_id_of(&self.ids, row)
    }

    /// Node id of every input row, indexed by row.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Uint32Array {
        node_id_table(&self.ids)
    }

    #[wasm_bindgen(js_name = showTidy)]
    pub fn show_tidy(&mut self, now: f64) {
        self.controller.show_tidy(now);
    }

    #[wasm_bindgen(js_name = showRadial)]
    pub fn show_radial(&mut self, now: f64) {
        self.controller.show_radial(now);
    }

    #[wasm_bindgen(js_name = toggleCluster)]
    pub fn toggle_cluster(&mut self, now: f64) {
        self.controller.toggle_cluster(now);
    }

    /// Tree nodes are not zoom targets; always false.
    #[wasm_bindgen(js_name = selectNode)]
    pub fn select_node(&self, node_id: u32) -> Result<bool, JsError> {
        let outcome = self.controller.select_node(NodeId(node_id))?;
        Ok(outcome == ZoomOutcome::Started)
    }

    /// Advance the animation. Returns true while more frames follow.
    pub fn tick(&mut self, now: f64) -> bool {
        self.controller.tick(now) == ControllerState::Animating
    }

    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> bool {
        self.controller.state() == ControllerState::Animating
    }

    /// Render data for the current frame.
    pub fn frame(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.controller.frame())?)
    }

    /// Canvas positions `[x0, y0, x1, y1, ...]`, one pair per node ID.
    pub fn positions(&self) -> Float64Array {
        Float64Array::from(&self.controller.positions()[..])
    }

    /// Node within `radius` pixels of a canvas point.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<u32> {
        self.controller.node_at(x, y, radius).map(|id| id.0)
    }

    /// Node closest to a canvas point, at any distance.
    #[wasm_bindgen(js_name = nearestNode)]
    pub fn nearest_node(&self, x: f64, y: f64) -> Option<u32> {
        self.controller.nearest_node(x, y).map(|id| id.0)
    }

    /// Nodes inside a canvas rectangle.
    #[wasm_bindgen(js_name = nodesInRect)]
    pub fn nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<u32> {
        self.controller
            .nodes_in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    /// The node followed by its ancestors, for hover highlighting.
    pub fn ancestors(&self, node_id: u32) -> Result<Vec<u32>, JsError> {
        let ids = self.controller.ancestors(NodeId(node_id))?;
        Ok(ids.into_iter().map(|id| id.0).collect())
    }

    /// `"uninitialized"`, `{ tidy: arrangement }` or `{ radial: arrangement }`.
    #[wasm_bindgen(js_name = layoutState)]
    pub fn layout_state(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.controller.layout_state())?)
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.controller.hierarchy().len() as u32
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::layout::{Arrangement, Rect};
    use crate::transition::TreeLayoutState;
    use std::f64::consts::TAU;

    const FLARE: &str = r#"{
        "name": "flare",
        "children": [
            {"name": "analytics", "children": [
                {"name": "cluster", "children": [
                    {"name": "AgglomerativeCluster", "value": 3938},
                    {"name": "CommunityStructure", "value": 3812},
                    {"name": "MergeEdge", "value": 743}
                ]},
                {"name": "graph", "children": [
                    {"name": "BetweennessCentrality", "value": 3534},
                    {"name": "LinkDistance", "value": 5731}
                ]}
            ]},
            {"name": "animate", "children": [
                {"name": "Easing", "value": 17010},
                {"name": "Tween", "value": 6006}
            ]},
            {"name": "data", "value": 1000},
            {"name": "empty", "children": [
                {"name": "nothing", "value": 0}
            ]}
        ]
    }"#;

    fn flare() -> Hierarchy {
        let record: Record = serde_json::from_str(FLARE).unwrap();
        Hierarchy::build(&record).unwrap()
    }

    fn find(h: &Hierarchy, name: &str) -> NodeId {
        h.ids().find(|&id| h.node(id).name == name).unwrap()
    }

    /// Test the full sunburst pipeline: JSON → hierarchy → colors → zoom → frame.
    #[test]
    fn test_sunburst_pipeline() {
        let h = flare();
        let config = SunburstConfig::default();
        let colors = assign_colors(&h, &config.colors, None);
        let mut zoom = SunburstZoom::new(h, colors, config);

        // Partition containment holds for every node.
        let h = zoom.hierarchy().clone();
        let rects: Vec<Rect> = zoom.current().to_vec();
        for id in h.ids().skip(1) {
            let parent = h.parent(id).unwrap();
            let (r, p) = (rects[id.index()], rects[parent.index()]);
            assert!(r.x0 >= p.x0 - 1e-9 && r.x1 <= p.x1 + 1e-9);
            assert_eq!(r.y0, p.y1);
        }

        // The zero-value branch still gets a (zero-width) slot and no label.
        let empty = find(&h, "empty");
        assert!(rects[empty.index()].span().abs() < 1e-9);
        let frame = zoom.frame();
        let empty_frame = frame.nodes.iter().find(|n| n.id == empty).unwrap();
        assert_eq!(empty_frame.label_opacity, 0.0);
        assert!(empty_frame.arc.end_angle - empty_frame.arc.start_angle < 1e-9);

        let analytics = find(&h, "analytics");
        assert_eq!(zoom.select_node(analytics, 0.0).unwrap(), ZoomOutcome::Started);
        while zoom.tick(16.0 * 50.0) == ControllerState::Animating {}
        let r = zoom.current()[analytics.index()];
        assert!(r.x0.abs() < 1e-9 && (r.x1 - TAU).abs() < 1e-9);
        assert_eq!(zoom.frame().center.label, "flare/analytics");

        let json = serde_json::to_value(zoom.frame()).unwrap();
        assert!(json["nodes"][0]["labelPlacement"]["rotate"].is_number());
        assert_eq!(json["center"]["clickable"], true);
    }

    /// Test the tree pipeline through every layout state.
    #[test]
    fn test_tree_pipeline() {
        let mut tree = TreeController::new(
            flare(),
            TreeConfig::default(),
            Box::new(CharWidthMeasure::default()),
        );

        let mut now = 0.0;
        tree.show_tidy(now);
        for expected in [
            TreeLayoutState::Tidy(Arrangement::Tidy),
            TreeLayoutState::Tidy(Arrangement::Cluster),
        ] {
            assert_eq!(tree.layout_state(), expected);
            now += 1000.0;
            assert_eq!(tree.tick(now), ControllerState::Idle);
            let positions = tree.positions();
            assert_eq!(positions.len(), tree.hierarchy().len() * 2);
            assert!(positions.iter().all(|v| v.is_finite()));
            tree.toggle_cluster(now);
        }

        tree.show_radial(now);
        now += 1000.0;
        tree.tick(now);
        let viewport = tree.frame().viewport;
        assert_eq!((viewport.translate_x, viewport.translate_y), (480.0, 480.0));
        let json = serde_json::to_value(tree.frame()).unwrap();
        assert_eq!(json["state"]["radial"], "tidy");
        assert_eq!(json["nodes"][0]["point"]["kind"], "radial");
    }

    /// Test a large tree built from an edge list, as tabular sources supply it.
    /// 1000 nodes with uneven branching, verifying every node gets laid out.
    #[test]
    fn test_large_tree_from_edges() {
        let node_count = 1000u32;
        let mut edges = Vec::new();
        let mut next_child = 1u32;
        let mut queue = vec![0u32];
        while next_child < node_count {
            let mut next_queue = Vec::new();
            for &parent in &queue {
                let children = match parent % 5 {
                    0 => 5,
                    1 => 3,
                    2 => 2,
                    3 => 1,
                    _ => 0,
                };
                for _ in 0..children {
                    if next_child >= node_count {
                        break;
                    }
                    edges.push(parent);
                    edges.push(next_child);
                    next_queue.push(next_child);
                    next_child += 1;
                }
            }
            if next_queue.is_empty() {
                break;
            }
            queue = next_queue;
        }
        let laid_out = next_child as usize;
        let names: Vec<String> = (0..laid_out).map(|i| format!("n{i}")).collect();
        let values: Vec<Option<f64>> = (0..laid_out).map(|i| Some((i % 7) as f64)).collect();

        let h = Hierarchy::from_edges(&names, &values, &edges).unwrap();
        assert_eq!(h.len(), laid_out);

        let layout = layout::layout_tree_measured(
            &h,
            Arrangement::Tidy,
            layout::Projection::Radial,
            &TreeConfig::default(),
            &CharWidthMeasure::default(),
            None,
        );
        assert_eq!(layout.points.len(), laid_out);
        for point in &layout.points {
            let layout::TreePoint::Radial { angle, radius } = *point else {
                panic!("expected radial points");
            };
            assert!(angle.is_finite() && radius.is_finite());
            assert!((0.0..=TAU).contains(&angle));
        }

        // Partition of the same tree conserves angle at every internal node.
        let rects = layout::partition(&h);
        for id in h.ids() {
            let kids = h.children(id);
            if kids.is_empty() || h.node(id).value == 0.0 {
                continue;
            }
            let sum: f64 = kids.iter().map(|c| rects[c.index()].span()).sum();
            assert!((sum - rects[id.index()].span()).abs() < 1e-9);
        }
    }

    /// Test that edge-list rows map back to the nodes built for them.
    #[test]
    fn test_edge_rows_map_to_node_ids() {
        let names: Vec<String> = ["x", "y", "top"].iter().map(|s| s.to_string()).collect();
        let (h, ids) = stratify(names.clone(), &[1.0, 2.0, f64::NAN], &[2, 0, 2, 1]).unwrap();

        for (row, name) in names.iter().enumerate() {
            let id = node_id_of(&ids, row as u32).unwrap();
            assert_eq!(&h.node(NodeId(id)).name, name);
        }
        assert_eq!(node_id_of(&ids, 3), None);
        let top = NodeId(node_id_of(&ids, 2).unwrap());
        assert_eq!(h.node(top).value, 3.0);
        assert_eq!(h.ancestors(ids[0]), vec![ids[0], top]);

        // Nested input keeps row == id.
        let nested = flare();
        assert!(pre_order_ids(&nested).iter().enumerate().all(|(i, id)| id.index() == i));
    }

    /// Test that the sunburst and tree built from one input share nothing but
    /// agree on branch hues.
    #[test]
    fn test_independent_charts_from_same_input() {
        let sunburst_tree = flare();
        let tree_tree = flare();
        assert_eq!(sunburst_tree, tree_tree);

        let config = SunburstConfig::default();
        let colors = assign_colors(&sunburst_tree, &config.colors, None);
        let mut zoom = SunburstZoom::new(sunburst_tree, colors, config);
        let tree = TreeController::new(
            tree_tree,
            TreeConfig::default(),
            Box::new(CharWidthMeasure::default()),
        );

        zoom.select_node(find(zoom.hierarchy(), "animate"), 0.0).unwrap();
        assert_eq!(tree.layout_state(), TreeLayoutState::Uninitialized);

        // Branch heads: the tree uses flat base colors, the sunburst shades
        // them, so compare hue only.
        for name in ["analytics", "animate", "data"] {
            let sid = find(zoom.hierarchy(), name);
            let tid = find(tree.hierarchy(), name);
            let s = color::Rgb::parse(&zoom.frame().nodes.iter().find(|n| n.id == sid).unwrap().color)
                .unwrap()
                .to_hsl();
            let t = color::Rgb::parse(tree.colors().get(tid)).unwrap().to_hsl();
            let diff = (s.h - t.h).abs();
            let diff = diff.min(360.0 - diff);
            assert!(diff < 3.0, "{name}: hue {} vs {}", s.h, t.h);
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::JSON;
    use std::f64::consts::{FRAC_PI_4, TAU};
    use wasm_bindgen_test::*;

    const DATA: &str = r#"{
        "name": "root",
        "children": [
            {"name": "a", "children": [
                {"name": "a1", "value": 3},
                {"name": "a2", "value": 1}
            ]},
            {"name": "b", "value": 4}
        ]
    }"#;

    fn json(text: &str) -> JsValue {
        JSON::parse(text).unwrap()
    }

    fn sunburst(config: JsValue) -> SunburstChart {
        SunburstChart::new(json(DATA), config, None)
            .unwrap_or_else(|_| panic!("sunburst should build"))
    }

    fn find(h: &Hierarchy, name: &str) -> NodeId {
        h.ids().find(|&id| h.node(id).name == name).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_missing_config_means_defaults() {
        let defaults = SunburstConfig::default();
        for missing in [JsValue::UNDEFINED, JsValue::NULL] {
            let config: SunburstConfig = decode_or_default(missing).unwrap();
            assert_eq!(config.size, defaults.size);
        }

        let config: SunburstConfig = decode_or_default(json(r#"{"size": 600}"#)).unwrap();
        assert_eq!(config.size, 600.0);
        assert_eq!(config.duration_ms, defaults.duration_ms);

        assert!(matches!(
            decode_or_default::<SunburstConfig>(JsValue::from_str("big")),
            Err(ChartError::Decode(_))
        ));
        assert_eq!(sunburst(JsValue::NULL).node_count(), 5);
    }

    #[wasm_bindgen_test]
    fn test_js_measure_falls_back_when_callback_fails() {
        let width = Function::new_with_args("label", "return label.length * 10");
        assert_eq!(JsMeasure(width).measure("abc"), 30.0);

        let throwing = Function::new_no_args("throw new Error('no canvas')");
        assert!(JsMeasure(throwing.clone()).measure("abc").is_nan());
        let not_a_number = Function::new_no_args("return 'wide'");
        assert!(JsMeasure(not_a_number).measure("abc").is_nan());

        let mut chart = TreeChart::new(json(DATA), JsValue::UNDEFINED, Some(throwing), None)
            .unwrap_or_else(|_| panic!("tree should build"));
        chart.show_tidy(0.0);
        assert!(!chart.tick(1000.0));
        let metrics = chart.controller.layout().unwrap().metrics;
        let provisional = TreeConfig::default().provisional_label_width;
        assert_eq!(metrics.widest, provisional);
        assert!(chart.positions().to_vec().iter().all(|v| v.is_finite()));
    }

    #[wasm_bindgen_test]
    fn test_color_function_overrides_branches() {
        let color_fn = Function::new_with_args("name", "return name === 'a' ? 'tomato' : undefined");
        let chart = TreeChart::new(json(DATA), JsValue::UNDEFINED, None, Some(color_fn))
            .unwrap_or_else(|_| panic!("tree should build"));
        let h = chart.controller.hierarchy();
        let colors = chart.controller.colors();
        for name in ["a", "a1", "a2"] {
            assert_eq!(colors.get(find(h, name)), "tomato");
        }
        assert_ne!(colors.get(find(h, "b")), "tomato");

        // Non-string answers keep the palette.
        let record: Record = serde_wasm_bindgen::from_value(json(DATA)).unwrap();
        let h = Hierarchy::build(&record).unwrap();
        let config = ColorConfig::default();
        let numeric = Function::new_no_args("return 42");
        assert_eq!(
            colors_with(&h, &config, Some(numeric)),
            assign_colors(&h, &config, None)
        );
    }

    #[wasm_bindgen_test]
    fn test_current_rects_are_flattened_per_node() {
        let chart = sunburst(JsValue::UNDEFINED);
        let flat = chart.current_rects().to_vec();
        assert_eq!(flat.len(), chart.node_count() as usize * 4);
        assert_eq!(&flat[..4], &[0.0, TAU, 0.0, 1.0]);
        for (i, r) in chart.zoom.current().iter().enumerate() {
            assert_eq!(&flat[i * 4..i * 4 + 4], &[r.x0, r.x1, r.y0, r.y1]);
        }
    }

    #[wasm_bindgen_test]
    fn test_node_at_takes_canvas_coordinates() {
        let chart = sunburst(json(r#"{"size": 600}"#));
        let a = find(chart.zoom.hierarchy(), "a");

        // 45 degrees clockwise from 12 o'clock, in ring 1 (radius 100).
        let (dx, dy) = (150.0 * FRAC_PI_4.sin(), -150.0 * FRAC_PI_4.cos());
        assert_eq!(chart.zoom.node_at(dx, dy), Some(a));
        assert_eq!(chart.node_at(300.0 + dx, 300.0 + dy), Some(a.0));
        assert_eq!(chart.node_at(dx, dy), None);
    }

    #[wasm_bindgen_test]
    fn test_from_edges_rows_round_trip() {
        let names = vec!["x".to_string(), "y".to_string(), "top".to_string()];
        let chart = TreeChart::from_edges(
            names.clone(),
            &[1.0, 2.0, f64::NAN],
            &[2, 0, 2, 1],
            JsValue::UNDEFINED,
            None,
            None,
        )
        .unwrap_or_else(|_| panic!("tree should build"));

        let h = chart.controller.hierarchy();
        for (row, name) in names.iter().enumerate() {
            let id = chart.node_id_of(row as u32).unwrap();
            assert_eq!(&h.node(NodeId(id)).name, name);
        }
        assert_eq!(chart.node_ids().to_vec(), vec![1, 2, 0]);
        assert_eq!(chart.node_id_of(3), None);

        let x = chart.node_id_of(0).unwrap();
        let top = chart.node_id_of(2).unwrap();
        let path = chart
            .ancestors(x)
            .unwrap_or_else(|_| panic!("row 0 is a known node"));
        assert_eq!(path, vec![x, top]);
    }
}
