//! Top-down Racer - simulation core
//!
//! Provides the frame-stepped race simulation and a headless driver that
//! runs a race without a rendering front end.

pub mod game_server;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

pub use game_server::{
    GameServer, GameState, InputState, Intent, Race, RaceConfig, RaceResult, RaceSnapshot,
    RaceStatus, ServerStats, StepReport, Track, Tuning, Vehicle, VehicleSnapshot,
};

/// Options for a headless race
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: RaceConfig,
    pub track: Track,
    /// Step with a constant dt instead of the wall clock, without sleeping
    pub fixed_dt: Option<f32>,
    /// Stop after this many ticks even without a winner
    pub max_frames: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: RaceConfig::default(),
            track: Track::demo(),
            fixed_dt: Some(1.0 / 60.0),
            max_frames: 60 * 60 * 10,
        }
    }
}

/// Outcome of a headless race
#[derive(Debug, Clone, Serialize)]
pub struct RaceSummary {
    pub ticks: u64,
    pub finished: bool,
    pub results: Vec<RaceResult>,
    pub snapshot: Option<RaceSnapshot>,
    pub stats: ServerStats,
    /// Every lap scored during the race as `(vehicle_id, new_score)`, in order
    pub laps: Vec<(u32, i32)>,
    pub wall_hits: u32,
    pub teleports: u32,
}

/// Run a race to completion (or `max_frames`). Human-controlled vehicles
/// receive no input.
pub fn run(options: RunOptions) -> Result<RaceSummary> {
    let mut server = GameServer::new();
    server.init_race(options.config, options.track)?;
    server.start_race();

    let frame_time = Duration::from_secs_f32(1.0 / server.tick_rate());
    let mut ticks = 0;
    let mut events = StepReport::default();
    while server.is_running() && ticks < options.max_frames {
        match options.fixed_dt {
            Some(dt) => {
                server.tick_with(dt, &[]);
            }
            None => {
                let started = Instant::now();
                server.tick(&[]);
                if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }
        events.merge(server.last_report().clone());
        ticks += 1;
    }

    let finished = server.get_state() == GameState::Results;
    if !finished {
        log::warn!("stopped after {} ticks without a winner", ticks);
    }

    Ok(RaceSummary {
        ticks,
        finished,
        results: server.get_results().unwrap_or_default(),
        snapshot: server.get_snapshot(),
        stats: server.get_stats(),
        laps: events.laps,
        wall_hits: events.wall_hits,
        teleports: events.teleports,
    })
}
