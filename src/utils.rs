//! Utility functions for planar geometry.

use std::f64::consts::{PI, TAU};

/// Rotate a 2D vector by `angle` radians (counter-clockwise).
pub fn rotate_2d(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (cos * x - sin * y, sin * x + cos * y)
}

/// Wrap an angle into (-pi, pi].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Euclidean norm of a 2D vector.
pub fn norm2(a: (f64, f64)) -> f64 {
    a.0.hypot(a.1)
}

/// Euclidean norm of a 3D vector.
pub fn norm3(a: (f64, f64, f64)) -> f64 {
    (a.0 * a.0 + a.1 * a.1 + a.2 * a.2).sqrt()
}

/// Euclidean distance between two 2D points.
pub fn distance2(a: (f64, f64), b: (f64, f64)) -> f64 {
    norm2((a.0 - b.0, a.1 - b.1))
}

/// Clamp `value` to `[-max_magnitude, max_magnitude]`.
pub fn clamp_magnitude(value: f64, max_magnitude: f64) -> f64 {
    value.clamp(-max_magnitude, max_magnitude)
}

/// Check that `value` lies strictly inside `(low, high)`.
pub(crate) fn in_open_range(value: f64, low: f64, high: f64) -> bool {
    value > low && value < high
}
