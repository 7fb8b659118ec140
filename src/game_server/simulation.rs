//! Simulation - frame clock and race lifecycle
//!
//! Owns the active race, measures dt between ticks and provides the
//! interface the rendering/input side drives once per frame.

use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::game_server::race::{
    Race, RaceConfig, RaceResult, RaceSnapshot, RaceStatus, StepReport,
};
use crate::game_server::track::Track;
use crate::game_server::vehicle::InputState;

/// Game state of the local session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Loading,
    Ready,
    Racing,
    Results,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub vehicle_count: u32,
    pub frame: u64,
    pub game_state: GameState,
}

/// Main game server
pub struct GameServer {
    /// Current game state
    state: GameState,
    /// Active race (if any)
    race: Option<Race>,
    /// Target tick rate (ticks per second)
    tick_rate: f32,
    /// Last tick timestamp
    last_tick: Instant,
    /// Recent tick costs for averaging
    tick_times: Vec<f32>,
    /// Whether the simulation advances on tick
    running: bool,
    /// Events of the most recent tick, merged over its substeps
    last_report: StepReport,
}

impl GameServer {
    /// Idle server with no race loaded
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            tick_rate: 60.0,
            last_tick: Instant::now(),
            tick_times: Vec::with_capacity(60),
            running: false,
            last_report: StepReport::default(),
        }
    }

    /// Initialize a new race on `track`
    pub fn init_race(&mut self, config: RaceConfig, track: Track) -> Result<()> {
        config.validate()?;
        track.validate()?;
        self.state = GameState::Loading;

        let mut race = Race::new(config, track);
        race.generate_vehicles();
        log::info!(
            "race initialized on {} with {} vehicles, {} laps",
            race.track.name,
            race.vehicles.len(),
            race.config.lap_target
        );

        self.race = Some(race);
        self.state = GameState::Ready;
        self.running = false;
        Ok(())
    }

    /// Start the race countdown
    pub fn start_race(&mut self) {
        if let Some(race) = &mut self.race {
            race.start_countdown();
            self.state = GameState::Racing;
            self.running = true;
            self.last_tick = Instant::now();
            log::info!("race started");
        }
    }

    /// Advance by the wall-clock time since the previous tick
    pub fn tick(&mut self, inputs: &[InputState]) -> Option<RaceSnapshot> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.tick_with(delta, inputs)
    }

    /// Advance by an explicit `delta`, clamped to the tuning's maximum frame
    /// time and split into substeps no longer than `max_substep_dt`
    pub fn tick_with(&mut self, delta: f32, inputs: &[InputState]) -> Option<RaceSnapshot> {
        self.last_report = StepReport::default();
        if !self.running {
            return self.get_snapshot();
        }

        let tick_start = Instant::now();

        if let Some(race) = &mut self.race {
            let tuning = &race.config.tuning;
            let delta = if delta.is_finite() {
                delta.clamp(0.0, tuning.max_frame_dt)
            } else {
                0.0
            };
            let substeps = (delta / tuning.max_substep_dt).ceil().max(1.0) as u32;
            let step = delta / substeps as f32;

            for _ in 0..substeps {
                let report = race.update(step, inputs);
                self.last_report.merge(report);
                if race.is_finished() {
                    break;
                }
            }

            if race.status == RaceStatus::Finished {
                self.state = GameState::Results;
                self.running = false;
            }
        }

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        self.get_snapshot()
    }

    /// Snapshot of the active race, if any
    pub fn get_snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Laps, contacts and teleports from the last tick
    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub fn get_results(&self) -> Option<Vec<RaceResult>> {
        self.race.as_ref().map(|r| r.finish_order.clone())
    }

    pub fn race(&self) -> Option<&Race> {
        self.race.as_ref()
    }

    /// Tick rate, average tick cost and race progress
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            tick_rate: self.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            vehicle_count: self.race.as_ref().map(|r| r.vehicles.len() as u32).unwrap_or(0),
            frame: self.race.as_ref().map(|r| r.frame).unwrap_or(0),
            game_state: self.state,
        }
    }

    pub fn get_state(&self) -> GameState {
        self.state
    }

    pub fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    /// Reset to idle state
    pub fn reset(&mut self) {
        self.state = GameState::Idle;
        self.race = None;
        self.running = false;
        self.tick_times.clear();
        self.last_report = StepReport::default();
    }

    /// Stop advancing on tick; the race is kept
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continue a paused race
    pub fn resume(&mut self) {
        if self.state == GameState::Racing {
            self.running = true;
            self.last_tick = Instant::now();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}
