//! Geometry - track primitives and overlap queries
//!
//! Static walls and the finish line are axis-aligned [`Rect`]s, rotated
//! obstacles and vehicle footprints are [`OrientedBox`]es, vehicles collide
//! as circles. Every query returns `None` when the shapes do not overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_server::math::{dot, length, normalize};

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            width,
            height,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.position
    }

    pub fn max(&self) -> Vec2 {
        self.position + Vec2::new(self.width, self.height)
    }
}

/// Rectangle rotated about its center. `width`/`height` are full extents,
/// `rotation` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl OrientedBox {
    pub fn new(center: Vec2, width: f32, height: f32, rotation: f32) -> Self {
        Self {
            center,
            width,
            height,
            rotation,
        }
    }

    /// The box's two local axes: along its width, then along its height.
    pub fn axes(&self) -> [Vec2; 2] {
        let (sin, cos) = self.rotation.sin_cos();
        [Vec2::new(cos, sin), Vec2::new(-sin, cos)]
    }

    /// Half-extent of the box projected onto `axis`.
    fn projected_half_extent(&self, axis: Vec2) -> f32 {
        let [u, v] = self.axes();
        self.width * 0.5 * dot(u, axis).abs() + self.height * 0.5 * dot(v, axis).abs()
    }
}

/// Minimum-translation result of an oriented box overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxContact {
    /// Candidate axis with the smallest overlap. Sign is not normalized.
    pub axis: Vec2,
    pub depth: f32,
}

/// Circle against rectangle contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectContact {
    /// Closest point on the rectangle to the circle center.
    pub point: Vec2,
    /// Points from the rectangle toward the circle center.
    /// Zero when the center is on or inside the rectangle.
    pub normal: Vec2,
    pub depth: f32,
}

/// Circle against circle contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleContact {
    /// Points from the second circle toward the first. Zero for concentric circles.
    pub normal: Vec2,
    pub depth: f32,
}

/// Separating-axis test over the four box axes (a's two, then b's two).
///
/// Stops at the first axis with no positive overlap. Otherwise reports the
/// axis of least overlap; ties keep the earliest axis.
pub fn obb_overlap(a: &OrientedBox, b: &OrientedBox) -> Option<BoxContact> {
    let [a0, a1] = a.axes();
    let [b0, b1] = b.axes();
    let between = b.center - a.center;

    let mut best: Option<BoxContact> = None;
    for axis in [a0, a1, b0, b1] {
        let reach = a.projected_half_extent(axis) + b.projected_half_extent(axis);
        let overlap = reach - dot(between, axis).abs();
        if overlap <= 0.0 {
            return None;
        }
        match best {
            Some(contact) if contact.depth <= overlap => {}
            _ => best = Some(BoxContact { axis, depth: overlap }),
        }
    }
    best
}

/// Point of `rect` nearest to `point`; `point` itself when it lies inside.
pub fn closest_point_on_rect(rect: &Rect, point: Vec2) -> Vec2 {
    let (min, max) = (rect.min(), rect.max());
    Vec2::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y))
}

pub fn circle_rect_penetration(rect: &Rect, center: Vec2, radius: f32) -> Option<RectContact> {
    let point = closest_point_on_rect(rect, center);
    let offset = center - point;
    let distance = length(offset);
    if distance < radius {
        Some(RectContact {
            point,
            normal: normalize(offset),
            depth: radius - distance,
        })
    } else {
        None
    }
}

pub fn circle_circle_penetration(
    center_a: Vec2,
    radius_a: f32,
    center_b: Vec2,
    radius_b: f32,
) -> Option<CircleContact> {
    let offset = center_a - center_b;
    let distance = length(offset);
    let reach = radius_a + radius_b;
    if distance < reach {
        Some(CircleContact {
            normal: normalize(offset),
            depth: reach - distance,
        })
    } else {
        None
    }
}
