//! Vehicle - per-car kinematic state and its physics
//!
//! Each vehicle has position, velocity, heading and lap score. The race
//! drives every vehicle through force application, integration and
//! collision response once per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_server::autopilot::AutopilotState;
use crate::game_server::geometry::{
    circle_circle_penetration, circle_rect_penetration, obb_overlap, OrientedBox, Rect,
};
use crate::game_server::math::{dot, heading_vector, length, normalize, right_vector, wrap_degrees};
use crate::game_server::tuning::Tuning;

/// A single control request, applied for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Accelerate,
    /// Slows the car toward a standstill without reversing it
    Brake,
    SteerLeft,
    SteerRight,
    /// Reverse thrust along the heading
    Decelerate,
}

/// Held-key state for one human-controlled vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub accelerate: bool,
    pub brake: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn intents(&self) -> impl Iterator<Item = Intent> {
        [
            (self.accelerate, Intent::Accelerate),
            (self.brake, Intent::Brake),
            (self.reverse, Intent::Decelerate),
            (self.left, Intent::SteerLeft),
            (self.right, Intent::SteerRight),
        ]
        .into_iter()
        .filter_map(|(held, intent)| held.then_some(intent))
    }
}

/// Who drives the vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Control {
    Human,
    Autopilot(AutopilotState),
}

/// Complete state for a single vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub name: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Heading in degrees, kept in [0, 360)
    pub angle: f32,
    /// Degrees per second
    pub angular_velocity: f32,
    pub radius: f32,
    pub drag: f32,
    pub angular_drag: f32,
    /// Completed laps; starts at -1 so the first crossing of the start line counts as lap 0
    pub score: i32,
    pub on_finish_line: bool,
    /// Divides acceleration after a hard wall hit, decays back to 1
    pub power_penalty: f32,
    pub control: Control,
    /// Set when any contact was resolved during the current frame
    pub collided: bool,
}

impl Vehicle {
    /// Create a vehicle at its starting pose
    pub fn new(id: u32, name: String, position: Vec2, angle: f32, tuning: &Tuning) -> Self {
        Self {
            id,
            name,
            position,
            velocity: Vec2::ZERO,
            angle: wrap_degrees(angle),
            angular_velocity: 0.0,
            radius: tuning.vehicle_radius,
            drag: tuning.linear_drag,
            angular_drag: tuning.angular_drag,
            score: -1,
            on_finish_line: false,
            power_penalty: 1.0,
            control: Control::Human,
            collided: false,
        }
    }

    /// Hand the vehicle to an autopilot
    pub fn with_autopilot(mut self, autopilot: AutopilotState) -> Self {
        self.control = Control::Autopilot(autopilot);
        self
    }

    pub fn is_autopilot(&self) -> bool {
        matches!(self.control, Control::Autopilot(_))
    }

    pub fn forward(&self) -> Vec2 {
        heading_vector(self.angle)
    }

    pub fn speed(&self) -> f32 {
        length(self.velocity)
    }

    /// Rotated rectangle covering the car body
    pub fn footprint(&self, tuning: &Tuning) -> OrientedBox {
        OrientedBox::new(
            self.position,
            tuning.vehicle_length,
            tuning.vehicle_width,
            self.angle.to_radians(),
        )
    }

    /// Add `force * dt` to the velocity (unit mass).
    pub fn apply_force(&mut self, force: Vec2, dt: f32) {
        self.velocity += force * dt;
    }

    /// Apply one held control for `dt` seconds.
    pub fn handle_input(&mut self, intent: Intent, dt: f32, tuning: &Tuning) {
        match intent {
            Intent::Accelerate => {
                let accel = tuning.acceleration(self.score, self.power_penalty);
                self.apply_force(self.forward() * accel, dt);
            }
            Intent::Decelerate => {
                let accel = tuning.acceleration(self.score, self.power_penalty);
                self.apply_force(-self.forward() * accel * tuning.reverse_factor, dt);
            }
            Intent::Brake => {
                let impulse = tuning.brake_decel * dt;
                let speed = self.speed();
                if impulse >= speed {
                    self.velocity = Vec2::ZERO;
                } else {
                    self.velocity -= normalize(self.velocity) * impulse;
                }
            }
            Intent::SteerLeft => self.angular_velocity -= tuning.steer_rate * dt,
            Intent::SteerRight => self.angular_velocity += tuning.steer_rate * dt,
        }
    }

    /// Advance position and heading, then damp velocity toward zero.
    pub fn integrate(&mut self, dt: f32, tuning: &Tuning) {
        self.position += self.velocity * dt;

        let i = (dt * self.drag).min(1.0);
        self.velocity = self.velocity * (1.0 - i) + Vec2::ZERO * i;
        let i = (dt * self.angular_drag).min(1.0);
        self.angular_velocity = self.angular_velocity * (1.0 - i);

        self.angle += self.angular_velocity * dt;
        self.power_penalty = (self.power_penalty - tuning.penalty_recovery * dt).max(1.0);
        self.angle = wrap_degrees(self.angle);
    }

    /// Cancel most of the sideways slide so the car grips the road.
    pub fn apply_lateral_friction(&mut self, dt: f32, tuning: &Tuning) {
        let right = right_vector(self.angle);
        let side_velocity = dot(self.velocity, right);
        if side_velocity == 0.0 {
            return;
        }
        let strength = tuning.lateral_grip + tuning.lateral_speed_factor * self.speed();
        // Never push past zero sideways velocity in one frame.
        let correction = side_velocity * (strength * dt).min(1.0);
        self.velocity -= right * correction;
    }

    /// Push the vehicle out of every wall it overlaps, one obstacle at a time.
    /// Returns whether any wall was hit.
    pub fn resolve_wall_collisions(&mut self, obstacles: &[Rect], tuning: &Tuning) -> bool {
        let mut hit = false;
        for obstacle in obstacles {
            let Some(contact) = circle_rect_penetration(obstacle, self.position, self.radius) else {
                continue;
            };
            if contact.normal == Vec2::ZERO {
                log::warn!(
                    "vehicle {} center is inside a wall at {:?}; contact skipped",
                    self.id,
                    contact.point
                );
                continue;
            }
            log::trace!("vehicle {} hit wall, depth {:.2}", self.id, contact.depth);
            self.push_out(contact.normal, contact.depth, tuning);
            hit = true;
        }
        self.collided |= hit;
        hit
    }

    /// Same response as walls, against rotated obstacles using the car footprint.
    pub fn resolve_box_collisions(&mut self, obstacles: &[OrientedBox], tuning: &Tuning) -> bool {
        let mut hit = false;
        for obstacle in obstacles {
            let footprint = self.footprint(tuning);
            let Some(contact) = obb_overlap(&footprint, obstacle) else {
                continue;
            };
            let normal = if dot(contact.axis, self.position - obstacle.center) < 0.0 {
                -contact.axis
            } else {
                contact.axis
            };
            log::trace!("vehicle {} hit block, depth {:.2}", self.id, contact.depth);
            self.push_out(normal, contact.depth, tuning);
            hit = true;
        }
        self.collided |= hit;
        hit
    }

    fn push_out(&mut self, normal: Vec2, depth: f32, tuning: &Tuning) {
        self.position += normal * depth;
        self.velocity -= normal * dot(self.velocity, normal);
        self.power_penalty = tuning.impact_penalty(self.speed());
    }

    /// Equal-mass contact with another vehicle. Returns whether they touched.
    pub fn resolve_vehicle_collision(&mut self, other: &mut Vehicle, tuning: &Tuning) -> bool {
        let scale = tuning.vehicle_hitbox_scale;
        let Some(contact) = circle_circle_penetration(
            self.position,
            self.radius * scale,
            other.position,
            other.radius * scale,
        ) else {
            return false;
        };

        self.collided = true;
        other.collided = true;
        let n = contact.normal;
        if n == Vec2::ZERO {
            // Stacked exactly on top of each other: no direction to separate along.
            return true;
        }

        let half = contact.depth * 0.5;
        self.position += n * half;
        other.position -= n * half;

        let mine = dot(self.velocity, n);
        let theirs = dot(other.velocity, n);
        if mine - theirs < 0.0 {
            self.velocity += n * (theirs - mine);
            other.velocity += n * (mine - theirs);
        }
        log::trace!("vehicles {} and {} collided", self.id, other.id);
        true
    }

    /// Edge-triggered lap counter. Returns true on the frame a lap is scored.
    pub fn update_score(&mut self, finish_line: &Rect) -> bool {
        let overlapping =
            circle_rect_penetration(finish_line, self.position, self.radius).is_some();
        let crossed = overlapping && !self.on_finish_line;
        if crossed {
            self.score += 1;
        }
        self.on_finish_line = overlapping;
        crossed
    }
}

/// Compact vehicle state for the rendering/UI side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: u32,
    pub position: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub score: i32,
    pub collided: bool,
    pub autopilot: bool,
}

impl From<&Vehicle> for VehicleSnapshot {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            position: vehicle.position,
            angle: vehicle.angle,
            speed: vehicle.speed(),
            score: vehicle.score,
            collided: vehicle.collided,
            autopilot: vehicle.is_autopilot(),
        }
    }
}
