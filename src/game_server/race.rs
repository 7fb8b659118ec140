//! Race - race configuration, the per-frame simulation step and lap scoring
//!
//! Handles race setup, the countdown, the fixed-order frame step and finish
//! detection.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game_server::autopilot::{Autopilot, AutopilotAction, AutopilotState};
use crate::game_server::math::{heading_vector, right_vector};
use crate::game_server::track::{StartSlot, Track};
use crate::game_server::tuning::Tuning;
use crate::game_server::vehicle::{Control, InputState, Vehicle, VehicleSnapshot};

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Laps needed to win
    pub lap_target: i32,
    /// Number of human-controlled vehicles (placed first on the grid)
    pub human_count: u32,
    /// Number of autopilot vehicles
    pub autopilot_count: u32,
    /// Countdown before the start (seconds)
    pub countdown: f32,
    /// Random sideways offset applied to each grid slot
    pub start_jitter: f32,
    /// Seed for the grid jitter
    pub seed: u64,
    pub tuning: Tuning,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            lap_target: 3,
            human_count: 2,
            autopilot_count: 2,
            countdown: 3.0,
            start_jitter: 0.0,
            seed: 0,
            tuning: Tuning::default(),
        }
    }
}

impl RaceConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read race config {}", path.display()))?;
        let config: RaceConfig = serde_json::from_str(&json)
            .with_context(|| format!("invalid race config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.lap_target >= 1, "lap_target must be at least 1, got {}", self.lap_target);
        ensure!(
            self.human_count + self.autopilot_count > 0,
            "a race needs at least one vehicle"
        );
        ensure!(
            self.countdown.is_finite() && self.countdown >= 0.0,
            "countdown must be a non-negative number of seconds"
        );
        ensure!(
            self.start_jitter.is_finite() && self.start_jitter >= 0.0,
            "start_jitter must not be negative"
        );
        self.tuning.validate().context("invalid tuning")
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    NotStarted,
    Countdown,
    Racing,
    Finished,
}

/// A vehicle that reached the lap target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub vehicle_id: u32,
    pub vehicle_name: String,
    pub finish_time: f32,
    pub position: u32,
}

/// What happened during one frame step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Vehicle ids that completed a lap this frame, with their new score
    pub laps: Vec<(u32, i32)>,
    /// Any vehicle-vehicle contact this frame
    pub vehicle_collision: bool,
    pub wall_hits: u32,
    pub teleports: u32,
}

impl StepReport {
    /// Fold a later step's report into this one.
    pub fn merge(&mut self, other: StepReport) {
        self.laps.extend(other.laps);
        self.vehicle_collision |= other.vehicle_collision;
        self.wall_hits += other.wall_hits;
        self.teleports += other.teleports;
    }
}

/// Complete race state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub config: RaceConfig,
    pub track: Track,
    pub status: RaceStatus,
    pub vehicles: Vec<Vehicle>,
    /// Racing time in seconds
    pub elapsed_time: f32,
    pub countdown: f32,
    pub frame: u64,
    pub finish_order: Vec<RaceResult>,
    /// Last frame's vehicle-vehicle contact flag
    pub collision_occurred: bool,
}

impl Race {
    pub fn new(config: RaceConfig, track: Track) -> Self {
        let countdown = config.countdown;
        Self {
            config,
            track,
            status: RaceStatus::NotStarted,
            vehicles: Vec::new(),
            elapsed_time: 0.0,
            countdown,
            frame: 0,
            finish_order: Vec::new(),
            collision_occurred: false,
        }
    }

    /// Place humans then autopilots on the starting grid. Extra vehicles
    /// queue up behind the grid in rows.
    pub fn generate_vehicles(&mut self) {
        self.vehicles.clear();
        let tuning = &self.config.tuning;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let jitter = self.config.start_jitter;
        let slots = self.track.start_grid.len().max(1);
        let total = self.config.human_count + self.config.autopilot_count;

        for i in 0..total {
            let index = i as usize;
            let slot = self.track.start_grid.get(index % slots).copied().unwrap_or(StartSlot {
                position: Vec2::ZERO,
                angle: 0.0,
            });
            let row = (index / slots) as f32;
            let forward = heading_vector(slot.angle);
            let offset = if jitter > 0.0 { rng.gen_range(-jitter..=jitter) } else { 0.0 };
            let position = slot.position - forward * row * tuning.vehicle_length * 1.5
                + right_vector(slot.angle) * offset;

            let vehicle = if i < self.config.human_count {
                Vehicle::new(i, format!("Player {}", i + 1), position, slot.angle, tuning)
            } else {
                let cpu = i - self.config.human_count;
                let route = if self.track.routes.is_empty() {
                    0
                } else {
                    cpu as usize % self.track.routes.len()
                };
                Vehicle::new(i, format!("CPU {}", cpu + 1), position, slot.angle, tuning)
                    .with_autopilot(AutopilotState::new(route, tuning))
            };
            self.vehicles.push(vehicle);
        }
    }

    pub fn start_countdown(&mut self) {
        self.status = RaceStatus::Countdown;
        self.countdown = self.config.countdown;
    }

    /// Update race state
    pub fn update(&mut self, delta: f32, inputs: &[InputState]) -> StepReport {
        match self.status {
            RaceStatus::NotStarted | RaceStatus::Finished => StepReport::default(),

            RaceStatus::Countdown => {
                self.countdown -= delta;
                if self.countdown <= 0.0 {
                    self.countdown = 0.0;
                    self.status = RaceStatus::Racing;
                    log::debug!("countdown over, racing");
                }
                StepReport::default()
            }

            RaceStatus::Racing => {
                let report = self.step(delta, inputs);
                if !self.finish_order.is_empty() {
                    self.status = RaceStatus::Finished;
                    if let Some(winner) = self.finish_order.first() {
                        log::info!(
                            "{} wins after {:.2}s ({} frames)",
                            winner.vehicle_name,
                            winner.finish_time,
                            self.frame
                        );
                    }
                }
                report
            }
        }
    }

    /// One simulation frame. The stage order is fixed:
    /// inputs, integrate + lateral friction, walls, scoring, autopilot, vehicle pairs.
    pub fn step(&mut self, dt: f32, inputs: &[InputState]) -> StepReport {
        let mut report = StepReport::default();
        if !dt.is_finite() || dt <= 0.0 {
            return report;
        }
        let tuning = &self.config.tuning;

        for (index, vehicle) in self.vehicles.iter_mut().enumerate() {
            vehicle.collided = false;
            let Some(input) = inputs.get(index) else {
                continue;
            };
            if matches!(vehicle.control, Control::Human) {
                for intent in input.intents() {
                    vehicle.handle_input(intent, dt, tuning);
                }
            }
        }

        for vehicle in &mut self.vehicles {
            vehicle.integrate(dt, tuning);
            vehicle.apply_lateral_friction(dt, tuning);
        }

        for vehicle in &mut self.vehicles {
            let walls = vehicle.resolve_wall_collisions(&self.track.obstacles, tuning);
            let blocks = vehicle.resolve_box_collisions(&self.track.rotated_obstacles, tuning);
            report.wall_hits += u32::from(walls) + u32::from(blocks);
        }

        self.elapsed_time += dt;
        for vehicle in &mut self.vehicles {
            if !vehicle.update_score(&self.track.finish_line) {
                continue;
            }
            log::info!("{} completed lap {}", vehicle.name, vehicle.score);
            report.laps.push((vehicle.id, vehicle.score));
            if vehicle.score >= self.config.lap_target
                && !self.finish_order.iter().any(|r| r.vehicle_id == vehicle.id)
            {
                self.finish_order.push(RaceResult {
                    vehicle_id: vehicle.id,
                    vehicle_name: vehicle.name.clone(),
                    finish_time: self.elapsed_time,
                    position: (self.finish_order.len() + 1) as u32,
                });
            }
        }

        for vehicle in &mut self.vehicles {
            let route = match &vehicle.control {
                Control::Autopilot(state) => self.track.route(state.route),
                Control::Human => continue,
            };
            let action = Autopilot::tick(vehicle, route, dt, tuning);
            if let AutopilotAction::Teleported { .. } = action {
                report.teleports += 1;
            }
        }

        let count = self.vehicles.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let (head, tail) = self.vehicles.split_at_mut(j);
                if head[i].resolve_vehicle_collision(&mut tail[0], tuning) {
                    report.vehicle_collision = true;
                }
            }
        }

        self.collision_occurred = report.vehicle_collision;
        self.frame += 1;
        report
    }

    pub fn is_finished(&self) -> bool {
        self.status == RaceStatus::Finished
    }

    pub fn winner(&self) -> Option<&RaceResult> {
        self.finish_order.first()
    }

    /// Vehicles ordered by score, best first; ties keep grid order.
    pub fn standings(&self) -> Vec<&Vehicle> {
        let mut order: Vec<&Vehicle> = self.vehicles.iter().collect();
        order.sort_by(|a, b| b.score.cmp(&a.score));
        order
    }

    /// Get compact snapshot for the rendering side
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            elapsed_time: self.elapsed_time,
            countdown: self.countdown,
            frame: self.frame,
            vehicles: self.vehicles.iter().map(VehicleSnapshot::from).collect(),
            collision_occurred: self.collision_occurred,
            lap_target: self.config.lap_target,
        }
    }
}

/// Compact race snapshot for the rendering/UI side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub elapsed_time: f32,
    pub countdown: f32,
    pub frame: u64,
    pub vehicles: Vec<VehicleSnapshot>,
    pub collision_occurred: bool,
    pub lap_target: i32,
}
