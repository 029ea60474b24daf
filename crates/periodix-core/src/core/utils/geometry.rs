use nalgebra::Vector3;

/// Relative tolerance used by [`is_close`].
pub const RELATIVE_TOLERANCE: f64 = 1e-5;
/// Absolute tolerance used by [`is_close`].
pub const ABSOLUTE_TOLERANCE: f64 = 1e-8;

/// Returns `true` if `a` and `b` are equal within the default tolerances.
///
/// Uses the asymmetric test `|a - b| <= atol + rtol * |b|`.
pub fn is_close(a: f64, b: f64) -> bool {
    is_close_with(a, b, RELATIVE_TOLERANCE, ABSOLUTE_TOLERANCE)
}

pub fn is_close_with(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= atol + rtol * b.abs()
}

/// Angle between two vectors in degrees.
///
/// Exactly orthogonal vectors report exactly 90 degrees.
pub fn angle_between_degrees(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let dot = u.dot(v);
    if dot == 0.0 {
        return 90.0;
    }
    let cos = (dot / (u.norm() * v.norm())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Cosine of an angle given in degrees; exactly 90 degrees yields exactly zero.
pub fn cos_degrees(angle: f64) -> f64 {
    if angle == 90.0 {
        0.0
    } else {
        angle.to_radians().cos()
    }
}
