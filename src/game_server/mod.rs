//! Game Server Module
//!
//! Vehicle physics, collision response, lap scoring and autopilot for the
//! top-down racer. The rendering/input side calls into this once per frame.

pub mod autopilot;
pub mod geometry;
pub mod math;
pub mod race;
pub mod simulation;
pub mod track;
pub mod tuning;
pub mod vehicle;

pub use autopilot::{Autopilot, AutopilotAction, AutopilotState};
pub use geometry::{OrientedBox, Rect};
pub use race::{Race, RaceConfig, RaceResult, RaceSnapshot, RaceStatus, StepReport};
pub use simulation::{GameServer, GameState, ServerStats};
pub use track::{StartSlot, Track};
pub use tuning::Tuning;
pub use vehicle::{Control, InputState, Intent, Vehicle, VehicleSnapshot};
