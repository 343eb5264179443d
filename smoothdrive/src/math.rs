//! Small float helpers shared by the controllers.
//!
//! `clamp` never panics, unlike `f32::clamp`, so bounds built from config
//! values are safe even when they come out inverted.

pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        return max;
    }
    if value < min {
        return min;
    }
    value
}

pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// `(current - last) / dt`, zero when `dt` is degenerate.
pub fn rate(current: f32, last: f32, dt: f32) -> f32 {
    if dt > 0.0 && dt.is_finite() {
        finite_or((current - last) / dt, 0.0)
    } else {
        0.0
    }
}

/// Exponential smoothing weight `clamp(1 - base^exponent, 0, 1)`.
pub fn smoothing_weight(base: f32, exponent: f32) -> f32 {
    clamp(finite_or(1.0 - base.powf(exponent), 1.0), 0.0, 1.0)
}

pub fn length(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    length([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

/// Rotates `v` by the inverse of the unit quaternion `q` (`[x, y, z, w]`),
/// i.e. takes a world vector into the vehicle's local frame.
pub fn rotate_inverse(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let (x, y, z, w) = (-q[0], -q[1], -q[2], q[3]);
    let t = [
        2.0 * (y * v[2] - z * v[1]),
        2.0 * (z * v[0] - x * v[2]),
        2.0 * (x * v[1] - y * v[0]),
    ];
    [
        v[0] + w * t[0] + (y * t[2] - z * t[1]),
        v[1] + w * t[1] + (z * t[0] - x * t[2]),
        v[2] + w * t[2] + (x * t[1] - y * t[0]),
    ]
}

/// Unit vector on the ground plane for a heading in degrees
/// (0 = north, counter-clockwise positive).
pub fn heading_direction(heading: f32) -> [f32; 2] {
    let radians = heading * DEG_TO_RAD;
    [-radians.sin(), radians.cos()]
}

/// Wraps an angle difference into `[-180, 180]`.
pub fn wrap_degrees(mut angle: f32) -> f32 {
    while angle < -180.0 {
        angle += 360.0;
    }
    while angle > 180.0 {
        angle -= 360.0;
    }
    angle
}
