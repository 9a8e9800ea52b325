//! Branch color assignment.
//!
//! Every top-level branch (child of the root) gets a hue sampled from a
//! cyclical rainbow; the hue is inherited by the whole subtree. With shading
//! enabled, internal nodes are slightly lighter and less saturated than the
//! branch color, leaves lighter still, and each level further down adds a
//! little more lightness.
//!
//! Colors are a pure function of the tree shape and the input order of the
//! root's children, so sibling re-sorting and re-layout never change them.

use std::f64::consts::PI;
use std::fmt;

use serde::Deserialize;

use crate::hierarchy::{Hierarchy, NodeId};

/// Simple RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    /// Format as CSS: rgb(r, g, b)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// HSL color: h in degrees, s and l in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl fmt::Display for Hsl {
    /// Format as CSS: hsl(h, s%, l%)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.h.rem_euclid(360.0);
        let s = (self.s * 100.0).clamp(0.0, 100.0);
        let l = (self.l * 100.0).clamp(0.0, 100.0);
        write!(f, "hsl({:.1}, {:.0}%, {:.0}%)", h, s, l)
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Rgb {
    /// Create from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` or `rgb(r, g, b)`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<_>>()?;
            return match digits.as_slice() {
                [r, g, b] => Some(Self::new(r * 17, g * 17, b * 17)),
                [r1, r0, g1, g0, b1, b0] => {
                    Some(Self::new(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0))
                }
                _ => None,
            };
        }
        let inner = text.strip_prefix("rgb(")?.strip_suffix(')')?;
        let parts: Vec<u8> = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8))
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    /// Convert to HSL.
    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let s = if l < 0.5 { d / (max + min) } else { d / (2.0 - max - min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl { h: h * 60.0, s, l }
    }
}

impl Hsl {
    /// Convert to RGB.
    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = channel(l);
            return Rgb::new(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let hue = |mut t: f64| {
            t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Rgb::new(
            channel(hue(h + 1.0 / 3.0)),
            channel(hue(h)),
            channel(hue(h - 1.0 / 3.0)),
        )
    }
}

/// Cyclical rainbow (a cubehelix sweep), `t` in [0, 1].
pub fn rainbow(t: f64) -> Rgb {
    let t = if (0.0..=1.0).contains(&t) { t } else { t - t.floor() };
    let ts = (t - 0.5).abs();
    let h = 360.0 * t - 100.0;
    let s = 1.5 - 1.5 * ts;
    let l = 0.8 - 0.9 * ts;

    // Cubehelix → RGB
    let angle = (h + 120.0) * PI / 180.0;
    let a = s * l * (1.0 - l);
    let (sin, cos) = angle.sin_cos();
    Rgb::new(
        channel(l + a * (-0.14861 * cos + 1.78277 * sin)),
        channel(l + a * (-0.29227 * cos - 0.90649 * sin)),
        channel(l + a * (1.97294 * cos)),
    )
}

/// `n` evenly spaced rainbow samples.
pub fn quantize(n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![rainbow(0.0)],
        _ => (0..n).map(|i| rainbow(i as f64 / (n - 1) as f64)).collect(),
    }
}

/// Color assignment settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorConfig {
    /// Color of the root node.
    pub root_color: String,
    /// Vary lightness by node kind and depth.
    pub shade_by_depth: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            root_color: "#ccc".to_string(),
            shade_by_depth: true,
        }
    }
}

/// Per-node colors, indexed by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    colors: Vec<String>,
}

impl ColorMap {
    /// Color of a node.
    pub fn get(&self, id: NodeId) -> &str {
        &self.colors[id.index()]
    }

    /// Number of colored nodes.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Lightness added to internal nodes, in percentage points.
const INTERNAL_LIGHTEN: f64 = 5.0;
/// Saturation removed from internal nodes, in percentage points.
const INTERNAL_DESATURATE: f64 = 10.0;
/// Lightness added to leaves.
const LEAF_LIGHTEN: f64 = 15.0;
/// Extra lightness per level below the branch head.
const DEPTH_LIGHTEN: f64 = 2.0;
/// Cap on the depth contribution.
const DEPTH_LIGHTEN_MAX: f64 = 10.0;

/// Assign colors top-down from the root's children.
///
/// `branch_color` may override the palette per top-level branch name; a
/// value that does not parse as `#hex` or `rgb()` is used verbatim and
/// left unshaded.
pub fn assign_colors(
    hierarchy: &Hierarchy,
    config: &ColorConfig,
    branch_color: Option<&dyn Fn(&str) -> Option<String>>,
) -> ColorMap {
    let root = hierarchy.root();
    let mut colors = vec![String::new(); hierarchy.len()];
    colors[root.index()] = config.root_color.clone();

    // Ordinal scale over branch names in input order.
    let mut branches: Vec<NodeId> = hierarchy.children(root).to_vec();
    branches.sort_by_key(|&id| hierarchy.node(id).input_index);
    let mut domain: Vec<&str> = Vec::new();
    for &id in &branches {
        let name = hierarchy.node(id).name.as_str();
        if !domain.contains(&name) {
            domain.push(name);
        }
    }
    let palette = quantize(branches.len() + 1);

    for &branch in &branches {
        let name = hierarchy.node(branch).name.as_str();
        let override_color = branch_color.and_then(|f| f(name));

        let base = match &override_color {
            Some(text) => Rgb::parse(text),
            None => domain
                .iter()
                .position(|&d| d == name)
                .map(|i| palette[i % palette.len()]),
        };

        for id in hierarchy.descendants_of(branch) {
            colors[id.index()] = match (base, &override_color) {
                (Some(rgb), _) if config.shade_by_depth => shade(rgb, hierarchy, id),
                (Some(rgb), _) => rgb.to_string(),
                (None, Some(text)) => text.clone(),
                (None, None) => config.root_color.clone(),
            };
        }
    }

    log::debug!(
        "assigned colors: {} branches, {} nodes",
        branches.len(),
        colors.len()
    );
    ColorMap { colors }
}

fn shade(base: Rgb, hierarchy: &Hierarchy, id: NodeId) -> String {
    let node = hierarchy.node(id);
    let depth_extra =
        (DEPTH_LIGHTEN * node.depth.saturating_sub(1) as f64).min(DEPTH_LIGHTEN_MAX);
    let mut hsl = base.to_hsl();
    if node.is_leaf() {
        hsl.l += (LEAF_LIGHTEN + depth_extra) / 100.0;
    } else {
        hsl.l += (INTERNAL_LIGHTEN + depth_extra) / 100.0;
        hsl.s -= INTERNAL_DESATURATE / 100.0;
    }
    hsl.l = hsl.l.min(0.95);
    hsl.s = hsl.s.max(0.0);
    hsl.to_rgb().to_string()
}
