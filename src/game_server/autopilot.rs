//! Autopilot - waypoint following for computer-driven vehicles
//!
//! The autopilot cycles through its route, turns toward the current
//! waypoint at a bounded rate and then asks for throttle through the same
//! input path a human uses. A vehicle that makes no progress for too long
//! is teleported onto its waypoint.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_server::math::{angular_lerp_degrees, length, wrap_degrees};
use crate::game_server::tuning::Tuning;
use crate::game_server::vehicle::{Control, Intent, Vehicle};

/// Per-vehicle navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopilotState {
    /// Index into the track's route list
    pub route: usize,
    pub waypoint_index: usize,
    /// Seconds left before the vehicle counts as stuck
    pub stuck_timer: f32,
    pub enabled: bool,
}

impl AutopilotState {
    pub fn new(route: usize, tuning: &Tuning) -> Self {
        Self {
            route,
            waypoint_index: 0,
            stuck_timer: tuning.stuck_duration,
            enabled: true,
        }
    }
}

/// What an autopilot tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutopilotAction {
    /// Disabled, human-driven or routeless
    Idle,
    /// Turned toward the waypoint and accelerated
    Steered,
    /// Reached a waypoint and moved on to the next one
    Advanced { waypoint: usize },
    /// Stuck timer ran out; moved onto the waypoint
    Teleported { waypoint: usize },
}

/// Autopilot logic
pub struct Autopilot;

impl Autopilot {
    /// Run one navigation tick for `vehicle` along `route`.
    pub fn tick(
        vehicle: &mut Vehicle,
        route: &[Vec2],
        dt: f32,
        tuning: &Tuning,
    ) -> AutopilotAction {
        if route.is_empty() {
            return AutopilotAction::Idle;
        }
        let position = vehicle.position;
        let Control::Autopilot(state) = &mut vehicle.control else {
            return AutopilotAction::Idle;
        };
        if !state.enabled {
            return AutopilotAction::Idle;
        }

        let mut action = AutopilotAction::Steered;
        state.waypoint_index %= route.len();
        let mut to_target = route[state.waypoint_index] - position;

        if length(to_target) < tuning.waypoint_proximity {
            state.waypoint_index = (state.waypoint_index + 1) % route.len();
            state.stuck_timer = tuning.stuck_duration;
            to_target = route[state.waypoint_index] - position;
            action = AutopilotAction::Advanced {
                waypoint: state.waypoint_index,
            };
        } else {
            state.stuck_timer -= dt;
            if state.stuck_timer <= 0.0 {
                let waypoint = state.waypoint_index;
                state.stuck_timer = tuning.stuck_duration;
                log::debug!(
                    "autopilot {} stuck, teleporting to waypoint {}",
                    vehicle.id,
                    waypoint
                );
                vehicle.position = route[waypoint];
                vehicle.velocity = Vec2::ZERO;
                return AutopilotAction::Teleported { waypoint };
            }
        }

        if to_target != Vec2::ZERO {
            let target = to_target.y.atan2(to_target.x).to_degrees();
            vehicle.angle = wrap_degrees(angular_lerp_degrees(
                vehicle.angle,
                target,
                tuning.autopilot_turn_step,
            ));
        }
        vehicle.handle_input(Intent::Accelerate, dt, tuning);
        action
    }
}
