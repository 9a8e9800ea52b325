//! Easing and interpolation primitives.

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Geometry that can be blended toward a target.
pub trait Interpolate: Clone {
    /// Value at eased progress `t`, where 0 is `self` and 1 is `to`.
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl<T: Interpolate> Interpolate for Vec<T> {
    /// Element-wise. Elements without a counterpart in `self` jump straight
    /// to the target.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        to.iter()
            .enumerate()
            .map(|(i, target)| match self.get(i) {
                Some(start) => start.interpolate(target, t),
                None => target.clone(),
            })
            .collect()
    }
}
