//! Vector math - 2D helpers and circular interpolation
//!
//! Vectors are `glam::Vec2`. The helpers here add the zero-guarded
//! normalization and the snap-on-arrival angle interpolation that the
//! vehicle and autopilot code rely on.

use glam::Vec2;
use std::f32::consts::TAU;

pub fn dot(a: Vec2, b: Vec2) -> f32 {
    a.dot(b)
}

pub fn length(a: Vec2) -> f32 {
    a.length()
}

/// Unit vector in the direction of `a`, or the zero vector when `a` has no length.
pub fn normalize(a: Vec2) -> Vec2 {
    a.normalize_or_zero()
}

/// Signed shortest distance from `current` to `target` on a circle of the given period,
/// in `[-period/2, period/2)`.
pub fn shortest_angular_distance(current: f32, target: f32, period: f32) -> f32 {
    let half = period * 0.5;
    (target - current + half).rem_euclid(period) - half
}

fn lerp_on_circle(current: f32, target: f32, max_step: f32, period: f32) -> f32 {
    let d = shortest_angular_distance(current, target, period);
    if d.abs() <= max_step {
        // Snap, so a steering controller locks on instead of oscillating.
        return target;
    }
    current + max_step.copysign(d)
}

/// Moves `current` toward `target` (radians) by at most `max_step`, taking the short way round.
/// Returns `target` exactly once it is within reach.
pub fn angular_lerp(current: f32, target: f32, max_step: f32) -> f32 {
    lerp_on_circle(current, target, max_step, TAU)
}

/// Degree-based counterpart of [`angular_lerp`].
pub fn angular_lerp_degrees(current: f32, target: f32, max_step: f32) -> f32 {
    lerp_on_circle(current, target, max_step, 360.0)
}

/// Wraps a heading into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unit forward vector for a heading in degrees.
pub fn heading_vector(angle_degrees: f32) -> Vec2 {
    let rad = angle_degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Unit right-hand vector for a heading in degrees.
pub fn right_vector(angle_degrees: f32) -> Vec2 {
    let forward = heading_vector(angle_degrees);
    Vec2::new(-forward.y, forward.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn normalize_gives_unit_length() {
        for v in [
            Vec2::new(3.0, 4.0),
            Vec2::new(-0.001, 0.0),
            Vec2::new(1e4, -2e4),
            Vec2::new(0.0, -7.5),
        ] {
            assert_abs_diff_eq!(length(normalize(v)), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(normalize(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(normalize(Vec2::new(f32::INFINITY, 1.0)), Vec2::ZERO);
        assert_eq!(normalize(Vec2::new(f32::NAN, 0.0)), Vec2::ZERO);
    }

    #[test]
    fn dot_and_length() {
        assert_eq!(dot(Vec2::new(1.0, 2.0), Vec2::new(3.0, -4.0)), -5.0);
        assert_eq!(length(Vec2::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn lerp_snaps_when_within_step() {
        let pairs = [(0.0, 0.5), (3.0, -3.0), (-PI + 0.1, PI - 0.1), (1.0, 1.0)];
        for (a, b) in pairs {
            let d = shortest_angular_distance(a, b, TAU).abs();
            assert_eq!(angular_lerp(a, b, d), b);
            assert_eq!(angular_lerp(a, b, d + 1.0), b);
        }
    }

    #[test]
    fn lerp_steps_the_short_way_round() {
        // 350 -> 10 is +20 across the wrap, not -340
        assert_abs_diff_eq!(angular_lerp_degrees(350.0, 10.0, 5.0), 355.0, epsilon = 1e-4);
        assert_abs_diff_eq!(angular_lerp_degrees(10.0, 350.0, 5.0), 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(angular_lerp(0.0, 1.0, 0.25), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn degrees_snap_is_exact() {
        assert_eq!(angular_lerp_degrees(359.0, 2.0, 3.0), 2.0);
    }

    #[test]
    fn wrap_degrees_range() {
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        let tiny = wrap_degrees(-1e-7);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn right_is_perpendicular_to_forward() {
        for angle in [0.0, 33.0, 90.0, 181.0, 300.0] {
            let forward = heading_vector(angle);
            assert_abs_diff_eq!(dot(forward, right_vector(angle)), 0.0, epsilon = 1e-6);
        }
        let right = right_vector(0.0);
        assert_abs_diff_eq!(right.y, 1.0, epsilon = 1e-6);
    }
}
