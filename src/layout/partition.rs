//! Polar partition (sunburst) layout.
//!
//! Assigns every node an angular interval `[x0, x1]` (radians) and a radial
//! interval `[y0, y1]` (depth units). The root covers the whole circle in
//! ring 0; each child list divides its parent's angular span in sibling
//! order, proportionally to value, and sits one ring further out.
//!
//! Besides the layout itself, this module holds the render-contract helpers
//! derived from a rectangle: ring-window visibility, the arc outline
//! parameters, label placement and size, and pointer hit testing.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::hierarchy::{Hierarchy, NodeId};

/// Angular × radial interval of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Start angle (radians).
    pub x0: f64,
    /// End angle (radians).
    pub x1: f64,
    /// Inner ring (depth units).
    pub y0: f64,
    /// Outer ring (depth units).
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// Angular span.
    #[inline]
    pub fn span(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Radial thickness.
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Re-express this rectangle relative to `focus`, which is stretched to
    /// the full circle and moved to ring 0.
    pub fn relative_to(&self, focus: &Rect, focus_depth: u32) -> Rect {
        let span = focus.span();
        let scale = |x: f64| {
            if span > 0.0 {
                ((x - focus.x0) / span).clamp(0.0, 1.0) * TAU
            } else {
                // Zero-width focus: points past it map to the end of the circle.
                if x > focus.x0 { TAU } else { 0.0 }
            }
        };
        let depth = focus_depth as f64;
        Rect {
            x0: scale(self.x0),
            x1: scale(self.x1),
            y0: (self.y0 - depth).max(0.0),
            y1: (self.y1 - depth).max(0.0),
        }
    }
}

/// Compute the partition layout. The result is indexed by [`NodeId`].
pub fn partition(hierarchy: &Hierarchy) -> Vec<Rect> {
    let mut rects = vec![Rect::default(); hierarchy.len()];
    rects[hierarchy.root().index()] = Rect::new(0.0, TAU, 0.0, 1.0);

    for id in hierarchy.descendants() {
        let children = hierarchy.children(id);
        if children.is_empty() {
            continue;
        }
        let parent = rects[id.index()];
        let depth = hierarchy.node(id).depth as f64;
        let total: f64 = children.iter().map(|&c| hierarchy.node(c).value).sum();

        // A group with nothing to share splits evenly.
        let weight = |c: NodeId| {
            if total > 0.0 {
                hierarchy.node(c).value / total
            } else {
                1.0 / children.len() as f64
            }
        };
        if total <= 0.0 {
            log::warn!(
                "'{}' has zero total value; splitting {} children evenly",
                hierarchy.node(id).name,
                children.len()
            );
        }

        let mut x = parent.x0;
        for (i, &child) in children.iter().enumerate() {
            let x1 = if i + 1 == children.len() {
                // Close the span exactly so rounding never leaves a gap.
                parent.x1
            } else {
                x + parent.span() * weight(child)
            };
            rects[child.index()] = Rect::new(x, x1, depth + 1.0, depth + 2.0);
            x = x1;
        }
    }

    rects
}

// =============================================================================
// Visibility
// =============================================================================

/// Rings shown around the current center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RingWindow {
    /// Innermost ring drawn (the center disc is ring 0).
    pub min_ring: f64,
    /// Outer edge of the outermost ring drawn.
    pub max_ring: f64,
}

impl Default for RingWindow {
    fn default() -> Self {
        Self {
            min_ring: 1.0,
            max_ring: 3.0,
        }
    }
}

impl RingWindow {
    fn contains(&self, r: &Rect) -> bool {
        r.y1 <= self.max_ring && r.y0 >= self.min_ring
    }

    /// Whether an arc is drawn and clickable.
    pub fn arc_visible(&self, r: &Rect) -> bool {
        self.contains(r) && r.x1 > r.x0
    }

    /// Whether an arc's label is drawn.
    pub fn label_visible(&self, r: &Rect, min_area: f64) -> bool {
        self.contains(r) && r.thickness() * r.span() > min_area
    }
}

// =============================================================================
// Render contract
// =============================================================================

/// Arc outline parameters in pixels and radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcShape {
    pub start_angle: f64,
    pub end_angle: f64,
    pub pad_angle: f64,
    pub pad_radius: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl ArcShape {
    /// Arc for a rectangle with a ring width of `radius` pixels.
    pub fn new(r: &Rect, radius: f64, pad_angle_max: f64) -> Self {
        let inner = r.y0 * radius;
        Self {
            start_angle: r.x0,
            end_angle: r.x1,
            pad_angle: (r.span() / 2.0).min(pad_angle_max),
            pad_radius: radius * 1.5,
            inner_radius: inner,
            outer_radius: inner.max(r.y1 * radius - 1.0),
        }
    }
}

/// Label transform: `rotate(rotate) translate(translate, 0) rotate(flip ? 180 : 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPlacement {
    /// Rotation in degrees, 0 pointing right.
    pub rotate: f64,
    /// Distance from the center in pixels.
    pub translate: f64,
    /// Whether the text is turned upside down to stay readable.
    pub flip: bool,
}

impl LabelPlacement {
    /// Place a label at the middle of an arc.
    pub fn new(r: &Rect, radius: f64) -> Self {
        let angle = (r.x0 + r.x1) / 2.0 * 180.0 / PI;
        Self {
            rotate: angle - 90.0,
            translate: (r.y0 + r.y1) / 2.0 * radius,
            flip: angle >= 180.0,
        }
    }
}

/// Font size in pixels that fits the arc's span.
pub fn font_size(r: &Rect, radius: f64, max: f64) -> f64 {
    (r.span() * radius + 2.0).floor().clamp(0.0, max)
}

/// Find the visible arc under a point given relative to the chart center.
///
/// Angles run clockwise from 12 o'clock, like the arc outline.
pub fn hit_test(
    rects: &[Rect],
    window: &RingWindow,
    radius: f64,
    x: f64,
    y: f64,
) -> Option<NodeId> {
    if radius <= 0.0 {
        return None;
    }
    let ring = (x * x + y * y).sqrt() / radius;
    let angle = x.atan2(-y).rem_euclid(TAU);

    rects
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, r)| {
            window.arc_visible(r) && ring >= r.y0 && ring < r.y1 && angle >= r.x0 && angle < r.x1
        })
        .map(|(i, _)| NodeId(i as u32))
}
