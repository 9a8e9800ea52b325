//! Tree diagram layout: arrangement, projection and viewport sizing.
//!
//! Combines the tidy and cluster engines with the two projections used by
//! the tree diagram. A linear tree grows left to right with a fixed node
//! spacing and a viewport whose height follows the tree; a radial tree is
//! fitted into a disc centered on the canvas.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::hierarchy::{Hierarchy, SiblingOrder};

use super::cluster::ClusterLayout;
use super::measure::{LabelMeasure, LabelMetrics, measure_labels};
use super::tidy_tree::{LayoutPoint, LayoutSize, Separation, TidyTreeLayout};

/// Node placement algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Arrangement {
    /// Compact layout, nodes of the same depth aligned.
    #[default]
    Tidy,
    /// Dendrogram, all leaves aligned.
    Cluster,
}

impl Arrangement {
    /// The other arrangement.
    pub fn toggled(self) -> Self {
        match self {
            Arrangement::Tidy => Arrangement::Cluster,
            Arrangement::Cluster => Arrangement::Tidy,
        }
    }
}

/// How layout coordinates map to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Projection {
    Linear,
    Radial,
}

/// A node position in its projection's own coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TreePoint {
    /// `x` along the breadth axis (drawn vertically), `y` the depth axis.
    Linear { x: f64, y: f64 },
    /// `angle` in radians clockwise from 12 o'clock, `radius` in pixels.
    Radial { angle: f64, radius: f64 },
}

impl TreePoint {
    /// Position relative to the viewport origin.
    pub fn to_cartesian(self) -> (f64, f64) {
        match self {
            TreePoint::Linear { x, y } => (y, x),
            TreePoint::Radial { angle, radius } => (radius * angle.sin(), -radius * angle.cos()),
        }
    }
}

/// Placement of the drawing on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeViewport {
    /// Offset applied to every node position.
    pub translate_x: f64,
    pub translate_y: f64,
    /// Canvas size the drawing needs.
    pub width: f64,
    pub height: f64,
}

/// Tree diagram settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    /// Canvas width in pixels (also the height of a radial tree).
    pub size: f64,
    /// Breadth between neighbouring nodes of a linear tree.
    pub node_spacing: f64,
    /// Node width used when the label measure yields no finite width.
    pub provisional_label_width: f64,
    /// Transition length in milliseconds.
    pub duration_ms: f64,
    /// Sibling order applied before layout.
    pub order: SiblingOrder,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            size: 960.0,
            node_spacing: 11.0,
            provisional_label_width: 60.0,
            duration_ms: 1000.0,
            order: SiblingOrder::ByHeight,
        }
    }
}

/// A laid-out tree diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    /// Node positions, indexed by [`NodeId`](crate::hierarchy::NodeId).
    pub points: Vec<TreePoint>,
    pub viewport: TreeViewport,
    /// Label metrics the layout was sized with.
    pub metrics: LabelMetrics,
}

/// Lay out a tree for a known set of label metrics.
pub fn compute_tree_layout(
    hierarchy: &Hierarchy,
    arrangement: Arrangement,
    projection: Projection,
    config: &TreeConfig,
    metrics: LabelMetrics,
) -> TreeLayout {
    let size = config.size.max(0.0);
    if config.size <= 0.0 {
        log::warn!("tree canvas size {} collapses the layout", config.size);
    }

    match projection {
        Projection::Linear => {
            let levels = hierarchy.height().max(1) as f64;
            let layout_size = LayoutSize::NodeSize {
                breadth: config.node_spacing,
                depth: size / levels - metrics.widest / 2.0,
            };
            let raw = run(hierarchy, arrangement, Separation::Uniform, layout_size);

            let (x0, x1) = raw
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p.x), hi.max(p.x))
                });
            let viewport = TreeViewport {
                translate_x: metrics.root.ceil(),
                translate_y: -x0 + config.node_spacing,
                width: size,
                height: x1 - x0 + config.node_spacing * 2.0,
            };
            TreeLayout {
                points: raw
                    .into_iter()
                    .map(|p| TreePoint::Linear { x: p.x, y: p.y })
                    .collect(),
                viewport,
                metrics,
            }
        }
        Projection::Radial => {
            let layout_size = LayoutSize::Extent {
                breadth: TAU,
                depth: ((size - metrics.widest * 2.0) / 2.0).max(0.0),
            };
            let raw = run(hierarchy, arrangement, Separation::DepthScaled, layout_size);
            TreeLayout {
                points: raw
                    .into_iter()
                    .map(|p| TreePoint::Radial {
                        angle: p.x,
                        radius: p.y,
                    })
                    .collect(),
                viewport: TreeViewport {
                    translate_x: size / 2.0,
                    translate_y: size / 2.0,
                    width: size,
                    height: size,
                },
                metrics,
            }
        }
    }
}

/// Label-aware layout: measure, then lay out once with the measured width.
///
/// Uses `cached` metrics when given. Otherwise labels are measured once; if
/// the measure cannot produce a width the provisional width stands in.
pub fn layout_tree_measured(
    hierarchy: &Hierarchy,
    arrangement: Arrangement,
    projection: Projection,
    config: &TreeConfig,
    measure: &dyn LabelMeasure,
    cached: Option<LabelMetrics>,
) -> TreeLayout {
    let metrics = cached.unwrap_or_else(|| {
        measure_labels(hierarchy, measure).unwrap_or_else(|| {
            log::warn!(
                "label measure returned no width, using {} px",
                config.provisional_label_width
            );
            LabelMetrics::provisional(config.provisional_label_width)
        })
    });
    log::debug!(
        "tree layout {:?}/{:?}: widest label {}",
        arrangement,
        projection,
        metrics.widest
    );
    compute_tree_layout(hierarchy, arrangement, projection, config, metrics)
}

fn run(
    hierarchy: &Hierarchy,
    arrangement: Arrangement,
    separation: Separation,
    size: LayoutSize,
) -> Vec<LayoutPoint> {
    match arrangement {
        Arrangement::Tidy => TidyTreeLayout::new(separation, size).compute(hierarchy),
        Arrangement::Cluster => ClusterLayout::new(separation, size).compute(hierarchy),
    }
}
