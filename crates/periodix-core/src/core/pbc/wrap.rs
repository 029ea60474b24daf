use nalgebra::Vector3;

/// Fractional padding added beyond the outermost atom when a non-periodic box
/// dimension has to grow. Keeps atoms off the new boundary.
pub const WRAP_PADDING: f64 = 0.001;

/// Fractional extents of the wrapped box relative to the old one.
///
/// Periodic axes are always `[0, 1]`. A non-periodic axis extends past
/// `[0, 1]` only when some atom lies outside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapBounds {
    pub lower: Vector3<f64>,
    pub upper: Vector3<f64>,
}

impl Default for WrapBounds {
    fn default() -> Self {
        Self {
            lower: Vector3::zeros(),
            upper: Vector3::repeat(1.0),
        }
    }
}

impl WrapBounds {
    /// `true` if the bounds leave the box unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Per-axis stretch factor `upper - lower`.
    pub fn extent(&self) -> Vector3<f64> {
        self.upper - self.lower
    }
}

/// Wraps fractional coordinates in place along periodic axes and measures the
/// extents needed to contain them along non-periodic axes.
///
/// On a periodic axis each coordinate is replaced by `f - floor(f)`, so it
/// ends up in `[0, 1)`. On a non-periodic axis the coordinates are left alone
/// and the returned bounds grow to `min - WRAP_PADDING` / `max + WRAP_PADDING`
/// when an atom lies below 0 / above 1. An empty batch yields the identity
/// bounds.
pub fn wrap_fractional(fractional: &mut [Vector3<f64>], pbc: [bool; 3]) -> WrapBounds {
    let mut bounds = WrapBounds::default();
    if fractional.is_empty() {
        return bounds;
    }

    for axis in 0..3 {
        if pbc[axis] {
            for f in fractional.iter_mut() {
                f[axis] = wrap_unit(f[axis]);
            }
        } else {
            let (min, max) = fractional
                .iter()
                .map(|f| f[axis])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            if min < bounds.lower[axis] {
                bounds.lower[axis] = min - WRAP_PADDING;
            }
            if max > bounds.upper[axis] {
                bounds.upper[axis] = max + WRAP_PADDING;
            }
        }
    }

    bounds
}

/// Maps `x` into `[0, 1)`.
fn wrap_unit(x: f64) -> f64 {
    let wrapped = x - x.floor();
    // -1e-17 - floor(-1e-17) rounds to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}
