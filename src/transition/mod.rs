//! Zoom and layout transitions.
//!
//! Controllers own the geometry of one chart: the resting layout, the
//! `current` geometry drawn this frame and the `target` it is heading for.
//! Time is supplied by the host on every call (milliseconds, typically
//! `performance.now()`), so controllers never read a clock themselves.
//!
//! A request that arrives mid-animation samples the in-flight geometry and
//! starts a fresh transition from there; nothing is queued.

pub mod easing;
pub mod sunburst;
pub mod tree;

use serde::Serialize;

pub use easing::{Interpolate, ease_cubic_in_out, lerp};
pub use sunburst::{SunburstConfig, SunburstFrame, SunburstZoom};
pub use tree::{TreeController, TreeFrame, TreeLayoutState};

/// Whether a controller still has frames to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ControllerState {
    Idle,
    Animating,
}

/// Result of a selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomOutcome {
    /// A transition toward new geometry started.
    Started,
    /// The selection has no effect on this chart.
    Ignored,
}

/// A timed interpolation from a snapshot to a target.
#[derive(Debug, Clone)]
pub struct Transition<G> {
    from: G,
    to: G,
    start: f64,
    duration: f64,
}

impl<G: Interpolate> Transition<G> {
    pub fn new(from: G, to: G, start: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start,
            duration,
        }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: f64) -> bool {
        self.progress(now) >= 1.0
    }

    /// Geometry at `now`. Exactly the target once finished.
    pub fn sample(&self, now: f64) -> G {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to.clone();
        }
        self.from.interpolate(&self.to, ease_cubic_in_out(progress))
    }

    pub fn target(&self) -> &G {
        &self.to
    }
}
