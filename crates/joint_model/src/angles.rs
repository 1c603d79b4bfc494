//! Wrap-around arithmetic for rotational variables.
//!
//! Every angle returned from this module lies in `[-π, π]`.

use std::f64::consts::{PI, TAU};

/// Map an angle into `[-π, π]`.
///
/// Values already inside the interval are returned unchanged, so the
/// function is idempotent bit-for-bit.
///
/// # Example
/// ```rust
/// use joint_model::angles::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
/// assert_eq!(normalize_angle(0.5), 0.5);
/// ```
pub fn normalize_angle(angle: f64) -> f64 {
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    let wrapped = angle % TAU;
    if wrapped < -PI {
        wrapped + TAU
    } else if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Signed shortest-arc difference `to - from`, in `[-π, π]`.
pub fn shortest_angular_distance(from: f64, to: f64) -> f64 {
    let delta = to - from;
    delta.sin().atan2(delta.cos())
}

/// Unsigned shortest-arc distance between two angles, in `[0, π]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    shortest_angular_distance(a, b).abs()
}

/// Move from `from` towards `to` along the shorter arc by fraction `t`.
pub fn interpolate_angle(from: f64, to: f64, t: f64) -> f64 {
    normalize_angle(from + shortest_angular_distance(from, to) * t)
}
