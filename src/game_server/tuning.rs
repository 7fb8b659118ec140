//! Tuning - every physics constant in one place
//!
//! A `Tuning` is built once (defaults or JSON) and passed by reference into
//! the frame step. Nothing in the simulation mutates it.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Physics and autopilot constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Velocity mix-toward-zero rate per second
    pub linear_drag: f32,
    /// Angular velocity mix-toward-zero rate per second
    pub angular_drag: f32,
    /// Collision radius of a vehicle against walls
    pub vehicle_radius: f32,
    /// Radius multiplier for vehicle-vs-vehicle contacts (visual footprint)
    pub vehicle_hitbox_scale: f32,
    /// Footprint length along the heading, used against rotated obstacles
    pub vehicle_length: f32,
    /// Footprint width across the heading
    pub vehicle_width: f32,
    /// Acceleration gained per completed lap (`k1`)
    pub accel_per_lap: f32,
    /// Acceleration at score zero (`k2`)
    pub base_accel: f32,
    /// Reverse thrust as a fraction of forward acceleration
    pub reverse_factor: f32,
    /// Braking deceleration (units/s^2), never overshoots zero speed
    pub brake_decel: f32,
    /// Angular velocity change per second of held steering (deg/s^2)
    pub steer_rate: f32,
    /// Constant part of the sideways-velocity correction
    pub lateral_grip: f32,
    /// Speed-dependent part of the sideways-velocity correction
    pub lateral_speed_factor: f32,
    /// Power penalty range after a wall hit; acceleration is divided by it
    pub penalty_min: f32,
    pub penalty_max: f32,
    /// Post-impact speed that adds one full unit of penalty
    pub penalty_speed_scale: f32,
    /// Linear decay of the penalty back toward 1, per second
    pub penalty_recovery: f32,
    /// Distance under which an autopilot counts a waypoint as reached
    pub waypoint_proximity: f32,
    /// Seconds without reaching a waypoint before the autopilot teleports
    pub stuck_duration: f32,
    /// Maximum autopilot heading change per tick (degrees)
    pub autopilot_turn_step: f32,
    /// Largest frame dt the server accepts from one tick
    pub max_frame_dt: f32,
    /// Largest dt of a single race step; longer ticks are split into substeps
    pub max_substep_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            linear_drag: 1.2,
            angular_drag: 6.0,
            vehicle_radius: 20.0,
            vehicle_hitbox_scale: 1.25,
            vehicle_length: 48.0,
            vehicle_width: 24.0,
            accel_per_lap: 20.0,
            base_accel: 480.0,
            reverse_factor: 0.5,
            brake_decel: 600.0,
            steer_rate: 900.0,
            lateral_grip: 8.0,
            lateral_speed_factor: 0.01,
            penalty_min: 1.5,
            penalty_max: 2.5,
            penalty_speed_scale: 200.0,
            penalty_recovery: 0.5,
            waypoint_proximity: 60.0,
            stuck_duration: 3.0,
            autopilot_turn_step: 4.0,
            max_frame_dt: 0.1,
            max_substep_dt: 1.0 / 60.0,
        }
    }
}

impl Tuning {
    /// Acceleration for a vehicle at `score` laps carrying `power_penalty`.
    pub fn acceleration(&self, score: i32, power_penalty: f32) -> f32 {
        (score as f32 * self.accel_per_lap + self.base_accel) / power_penalty
    }

    /// Penalty imposed after a wall hit that left the vehicle at `speed`.
    pub fn impact_penalty(&self, speed: f32) -> f32 {
        let penalty = self.penalty_min + speed / self.penalty_speed_scale;
        penalty.clamp(self.penalty_min, self.penalty_max)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("linear_drag", self.linear_drag),
            ("angular_drag", self.angular_drag),
            ("vehicle_radius", self.vehicle_radius),
            ("vehicle_hitbox_scale", self.vehicle_hitbox_scale),
            ("vehicle_length", self.vehicle_length),
            ("vehicle_width", self.vehicle_width),
            ("accel_per_lap", self.accel_per_lap),
            ("base_accel", self.base_accel),
            ("reverse_factor", self.reverse_factor),
            ("brake_decel", self.brake_decel),
            ("steer_rate", self.steer_rate),
            ("lateral_grip", self.lateral_grip),
            ("lateral_speed_factor", self.lateral_speed_factor),
            ("penalty_min", self.penalty_min),
            ("penalty_max", self.penalty_max),
            ("penalty_speed_scale", self.penalty_speed_scale),
            ("penalty_recovery", self.penalty_recovery),
            ("waypoint_proximity", self.waypoint_proximity),
            ("stuck_duration", self.stuck_duration),
            ("autopilot_turn_step", self.autopilot_turn_step),
            ("max_frame_dt", self.max_frame_dt),
            ("max_substep_dt", self.max_substep_dt),
        ];
        for (name, value) in fields {
            ensure!(value.is_finite(), "tuning.{name} must be finite, got {value}");
            ensure!(value >= 0.0, "tuning.{name} must not be negative, got {value}");
        }

        for (name, value) in [
            ("linear_drag", self.linear_drag),
            ("angular_drag", self.angular_drag),
            ("vehicle_radius", self.vehicle_radius),
            ("vehicle_hitbox_scale", self.vehicle_hitbox_scale),
            ("penalty_speed_scale", self.penalty_speed_scale),
            ("waypoint_proximity", self.waypoint_proximity),
            ("stuck_duration", self.stuck_duration),
            ("autopilot_turn_step", self.autopilot_turn_step),
            ("max_frame_dt", self.max_frame_dt),
            ("max_substep_dt", self.max_substep_dt),
        ] {
            ensure!(value > 0.0, "tuning.{name} must be positive");
        }

        ensure!(
            self.penalty_min >= 1.0 && self.penalty_min <= self.penalty_max,
            "tuning penalty range must satisfy 1 <= penalty_min <= penalty_max, got [{}, {}]",
            self.penalty_min,
            self.penalty_max
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn acceleration_grows_with_score() {
        let tuning = Tuning::default();
        let start = tuning.acceleration(-1, 1.0);
        let later = tuning.acceleration(2, 1.0);
        assert_eq!(start, tuning.base_accel - tuning.accel_per_lap);
        assert!(later > start);
        assert_eq!(tuning.acceleration(0, 2.0), tuning.base_accel / 2.0);
    }

    #[test]
    fn impact_penalty_is_clamped() {
        let tuning = Tuning::default();
        assert_eq!(tuning.impact_penalty(0.0), 1.5);
        assert_eq!(tuning.impact_penalty(100.0), 2.0);
        assert_eq!(tuning.impact_penalty(10_000.0), 2.5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{ "linear_drag": 0.3 }"#).unwrap();
        assert_eq!(tuning.linear_drag, 0.3);
        assert_eq!(tuning.vehicle_hitbox_scale, 1.25);
    }

    #[test]
    fn rejects_bad_penalty_range() {
        let tuning = Tuning {
            penalty_min: 3.0,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("penalty"));
    }

    #[test]
    fn rejects_zero_substep() {
        let tuning = Tuning {
            max_substep_dt: 0.0,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("max_substep_dt"));
    }

    #[test]
    fn rejects_zero_drag() {
        let tuning = Tuning {
            linear_drag: 0.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }
}
