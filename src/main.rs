use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use racer_lib::{RaceConfig, RunOptions, Track};

#[derive(Parser, Debug)]
#[command(name = "racer", version, about = "Run a headless top-down race")]
struct Opts {
    /// Race config JSON (lap target, vehicle counts, tuning)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Track JSON (walls, finish line, routes, start grid); defaults to the demo circuit
    #[arg(long)]
    track: Option<PathBuf>,

    /// Override the lap target
    #[arg(long)]
    laps: Option<i32>,

    /// Override the number of human vehicles (they sit idle)
    #[arg(long)]
    humans: Option<u32>,

    /// Override the number of autopilot vehicles
    #[arg(long)]
    autopilots: Option<u32>,

    /// Fixed step in seconds; 0 runs against the wall clock at 60 Hz
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 36_000)]
    max_frames: u64,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opts::parse();

    let mut config = match &opt.config {
        Some(path) => RaceConfig::load(path)?,
        None => RaceConfig::default(),
    };
    if let Some(laps) = opt.laps {
        config.lap_target = laps;
    }
    if let Some(humans) = opt.humans {
        config.human_count = humans;
    }
    if let Some(autopilots) = opt.autopilots {
        config.autopilot_count = autopilots;
    }

    let track = match &opt.track {
        Some(path) => Track::load(path)?,
        None => Track::demo(),
    };

    let summary = racer_lib::run(RunOptions {
        config,
        track,
        fixed_dt: (opt.dt > 0.0).then_some(opt.dt),
        max_frames: opt.max_frames,
    })?;

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for result in &summary.results {
            println!(
                "{}. {} ({:.2}s)",
                result.position, result.vehicle_name, result.finish_time
            );
        }
        if let Some(snapshot) = &summary.snapshot {
            for vehicle in &snapshot.vehicles {
                println!("vehicle {}: {} laps", vehicle.id, vehicle.score.max(0));
            }
        }
        println!(
            "{} ticks, {} wall hits, {} teleports",
            summary.ticks, summary.wall_hits, summary.teleports
        );
    }
    Ok(())
}
