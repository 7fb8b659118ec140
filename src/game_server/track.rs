//! Track - static level data
//!
//! Walls, rotated blocks, the finish line, autopilot routes and the
//! starting grid. Loaded once before the race and never modified.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_server::geometry::{OrientedBox, Rect};

/// Starting pose for one grid position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartSlot {
    pub position: Vec2,
    /// Heading in degrees
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub obstacles: Vec<Rect>,
    #[serde(default)]
    pub rotated_obstacles: Vec<OrientedBox>,
    pub finish_line: Rect,
    /// One waypoint loop per autopilot profile
    pub routes: Vec<Vec<Vec2>>,
    pub start_grid: Vec<StartSlot>,
}

impl Track {
    /// Built-in 1280x720 circuit: a walled arena around a central block,
    /// driven clockwise starting on the top straight.
    pub fn demo() -> Self {
        let lane = |x: f32, y: f32| Vec2::new(x, y);
        Self {
            name: "Demo Circuit".to_string(),
            obstacles: vec![
                Rect::new(0.0, 0.0, 1280.0, 20.0),
                Rect::new(0.0, 700.0, 1280.0, 20.0),
                Rect::new(0.0, 0.0, 20.0, 720.0),
                Rect::new(1260.0, 0.0, 20.0, 720.0),
                Rect::new(300.0, 220.0, 680.0, 280.0),
            ],
            rotated_obstacles: vec![OrientedBox::new(
                Vec2::new(640.0, 672.0),
                36.0,
                36.0,
                std::f32::consts::FRAC_PI_4,
            )],
            finish_line: Rect::new(600.0, 20.0, 20.0, 200.0),
            routes: vec![
                vec![
                    lane(800.0, 120.0),
                    lane(1120.0, 120.0),
                    lane(1120.0, 360.0),
                    lane(1120.0, 600.0),
                    lane(640.0, 600.0),
                    lane(160.0, 600.0),
                    lane(160.0, 360.0),
                    lane(160.0, 120.0),
                    lane(400.0, 120.0),
                ],
                vec![
                    lane(800.0, 160.0),
                    lane(1080.0, 160.0),
                    lane(1080.0, 360.0),
                    lane(1080.0, 560.0),
                    lane(640.0, 560.0),
                    lane(200.0, 560.0),
                    lane(200.0, 360.0),
                    lane(200.0, 160.0),
                    lane(400.0, 160.0),
                ],
            ],
            start_grid: vec![
                StartSlot {
                    position: lane(500.0, 80.0),
                    angle: 0.0,
                },
                StartSlot {
                    position: lane(500.0, 160.0),
                    angle: 0.0,
                },
                StartSlot {
                    position: lane(420.0, 80.0),
                    angle: 0.0,
                },
                StartSlot {
                    position: lane(420.0, 160.0),
                    angle: 0.0,
                },
            ],
        }
    }

    /// Parse and validate a track from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let track: Track = serde_json::from_str(json).context("invalid track JSON")?;
        track.validate()?;
        Ok(track)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read track {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("failed to load track {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let rects = self.obstacles.iter().chain(std::iter::once(&self.finish_line));
        for (i, rect) in rects.enumerate() {
            ensure!(
                rect.width >= 0.0 && rect.height >= 0.0,
                "rectangle {i} has negative size {}x{}",
                rect.width,
                rect.height
            );
            ensure!(
                rect.position.is_finite() && rect.width.is_finite() && rect.height.is_finite(),
                "rectangle {i} is not finite"
            );
        }
        for (i, block) in self.rotated_obstacles.iter().enumerate() {
            ensure!(
                block.width >= 0.0 && block.height >= 0.0,
                "rotated obstacle {i} has negative extents"
            );
            ensure!(
                block.center.is_finite() && block.rotation.is_finite(),
                "rotated obstacle {i} is not finite"
            );
        }
        for (i, route) in self.routes.iter().enumerate() {
            ensure!(!route.is_empty(), "route {i} has no waypoints");
            ensure!(route.iter().all(|p| p.is_finite()), "route {i} has a non-finite waypoint");
        }
        ensure!(!self.start_grid.is_empty(), "track has no start slots");
        Ok(())
    }

    pub fn route(&self, id: usize) -> &[Vec2] {
        self.routes.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::demo()
    }
}
