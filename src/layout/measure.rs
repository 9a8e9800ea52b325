//! Label measurement for label-aware tree sizing.
//!
//! Text metrics live in the renderer, so widths are supplied through the
//! [`LabelMeasure`] trait. Any `Fn(&str) -> f64` is a measure;
//! [`CharWidthMeasure`] is the built-in estimate used when no renderer
//! callback is available.

use crate::hierarchy::Hierarchy;

/// Radius of a node's circle marker in pixels.
pub const CIRCLE_RADIUS: f64 = 3.0;
/// Gap between the circle and its label in pixels.
pub const LABEL_OFFSET: f64 = 6.0;

/// Measures the rendered width of a label in pixels.
pub trait LabelMeasure {
    fn measure(&self, label: &str) -> f64;
}

impl<F: Fn(&str) -> f64> LabelMeasure for F {
    fn measure(&self, label: &str) -> f64 {
        self(label)
    }
}

/// Fixed advance per character. 6 px fits a 10 px sans-serif font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharWidthMeasure {
    pub char_width: f64,
}

impl Default for CharWidthMeasure {
    fn default() -> Self {
        Self { char_width: 6.0 }
    }
}

impl LabelMeasure for CharWidthMeasure {
    fn measure(&self, label: &str) -> f64 {
        label.chars().count() as f64 * self.char_width
    }
}

/// Measured node extents, cached after the first layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMetrics {
    /// Widest node (circle plus label), rounded up to whole pixels.
    pub widest: f64,
    /// Extent of the root node, which sets the left margin of a linear tree.
    pub root: f64,
}

impl LabelMetrics {
    /// Metrics for the provisional width used before anything is measured.
    pub fn provisional(width: f64) -> Self {
        Self {
            widest: width,
            root: width,
        }
    }
}

/// Width a node occupies: its label, the gap and the circle marker.
fn node_extent(measure: &dyn LabelMeasure, label: &str) -> Option<f64> {
    let width = measure.measure(label);
    width
        .is_finite()
        .then(|| (width.max(0.0) + LABEL_OFFSET + CIRCLE_RADIUS).ceil())
}

/// Measure every node's label.
///
/// Returns `None` if the measure reports a non-finite width for any label.
pub fn measure_labels(hierarchy: &Hierarchy, measure: &dyn LabelMeasure) -> Option<LabelMetrics> {
    let root = node_extent(measure, &hierarchy.node(hierarchy.root()).name)?;
    let mut widest = root;
    for id in hierarchy.ids().skip(1) {
        widest = widest.max(node_extent(measure, &hierarchy.node(id).name)?);
    }
    Some(LabelMetrics { widest, root })
}
