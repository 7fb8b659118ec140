//! End-to-end race scenarios
//!
//! Drives the public API the way a front end would: build a race, feed it
//! frames, read snapshots back.

use approx::assert_abs_diff_eq;
use glam::Vec2;
use racer_lib::game_server::autopilot::{Autopilot, AutopilotAction, AutopilotState};
use racer_lib::game_server::geometry::{circle_circle_penetration, circle_rect_penetration, Rect};
use racer_lib::game_server::math::{angular_lerp, length, normalize, shortest_angular_distance};
use racer_lib::game_server::track::StartSlot;
use racer_lib::{
    GameServer, GameState, InputState, Race, RaceConfig, RaceStatus, RunOptions, Track, Tuning,
    Vehicle,
};

const DT: f32 = 1.0 / 60.0;

// ============================================================================
// Helpers
// ============================================================================

/// Square loop with no walls; the finish line sits on the first leg.
fn open_loop() -> Track {
    Track {
        name: "open loop".into(),
        obstacles: Vec::new(),
        rotated_obstacles: Vec::new(),
        finish_line: Rect::new(280.0, -100.0, 40.0, 200.0),
        routes: vec![vec![
            Vec2::new(600.0, 0.0),
            Vec2::new(600.0, 600.0),
            Vec2::new(0.0, 600.0),
            Vec2::new(0.0, 0.0),
        ]],
        start_grid: vec![StartSlot {
            position: Vec2::new(60.0, 0.0),
            angle: 0.0,
        }],
    }
}

fn run_frames(race: &mut Race, frames: usize) {
    for _ in 0..frames {
        race.update(DT, &[]);
    }
}

// ============================================================================
// Vector math
// ============================================================================

#[test]
fn normalize_is_unit_or_zero() {
    let mut x = -50.0;
    while x <= 50.0 {
        let v = Vec2::new(x, 17.0 - x * 0.5);
        assert_abs_diff_eq!(length(normalize(v)), 1.0, epsilon = 1e-5);
        x += 3.7;
    }
    assert_eq!(normalize(Vec2::ZERO), Vec2::ZERO);
}

#[test]
fn angular_lerp_snaps_to_target() {
    let angles = [-3.0_f32, -1.2, 0.0, 0.4, 2.9, 6.0];
    for &a in &angles {
        for &b in &angles {
            let s = shortest_angular_distance(a, b, std::f32::consts::TAU).abs();
            assert_eq!(angular_lerp(a, b, s), b);
        }
    }
}

// ============================================================================
// Collision scenarios
// ============================================================================

#[test]
fn concentric_circles_collide_with_full_depth() {
    let center = Vec2::new(5.0, 5.0);
    let hit = circle_circle_penetration(center, 3.0, center, 4.0).unwrap();
    assert_eq!(hit.depth, 7.0);
    assert_eq!(hit.normal, Vec2::ZERO);
}

#[test]
fn embedded_vehicle_is_pushed_exactly_out() {
    let tuning = Tuning::default();
    let wall = Rect::new(100.0, 0.0, 50.0, 400.0);
    let mut car = Vehicle::new(0, "p1".into(), Vec2::new(70.0, 200.0), 0.0, &tuning);
    car.radius = 40.0;

    let depth = circle_rect_penetration(&wall, car.position, car.radius).unwrap().depth;
    assert_abs_diff_eq!(depth, 10.0, epsilon = 1e-5);

    car.resolve_wall_collisions(&[wall], &tuning);
    let depth = circle_rect_penetration(&wall, car.position, car.radius).map_or(0.0, |c| c.depth);
    assert_abs_diff_eq!(depth, 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(car.position.x, 60.0, epsilon = 1e-3);
}

#[test]
fn head_on_collision_conserves_momentum() {
    let tuning = Tuning::default();
    let mut a = Vehicle::new(0, "a".into(), Vec2::new(0.0, 0.0), 0.0, &tuning);
    let mut b = Vehicle::new(1, "b".into(), Vec2::new(45.0, 3.0), 180.0, &tuning);
    a.velocity = Vec2::new(150.0, 0.0);
    b.velocity = Vec2::new(-150.0, 0.0);

    let n = normalize(a.position - b.position);
    let before = a.velocity.dot(n) + b.velocity.dot(n);
    let total_before = a.velocity + b.velocity;

    assert!(a.resolve_vehicle_collision(&mut b, &tuning));
    let after = a.velocity.dot(n) + b.velocity.dot(n);
    assert_abs_diff_eq!(before, after, epsilon = 1e-3);
    let total_after = a.velocity + b.velocity;
    assert_abs_diff_eq!(total_before.x, total_after.x, epsilon = 1e-3);
    assert_abs_diff_eq!(total_before.y, total_after.y, epsilon = 1e-3);
}

// ============================================================================
// Vehicle dynamics
// ============================================================================

#[test]
fn coasting_vehicle_slows_but_keeps_direction() {
    let tuning = Tuning::default();
    let mut car = Vehicle::new(0, "p1".into(), Vec2::ZERO, 0.0, &tuning);
    car.drag = 0.3;
    car.velocity = Vec2::new(100.0, 0.0);
    for _ in 0..60 {
        car.integrate(DT, &tuning);
        car.apply_lateral_friction(DT, &tuning);
    }
    let speed = car.speed();
    assert!(speed < 100.0 && speed > 0.0, "speed {speed}");
    assert!(car.velocity.x > 0.0);
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn resting_on_finish_line_scores_once() {
    let mut track = open_loop();
    track.start_grid = vec![StartSlot {
        position: Vec2::new(300.0, 0.0),
        angle: 0.0,
    }];
    let config = RaceConfig {
        human_count: 1,
        autopilot_count: 0,
        countdown: 0.0,
        ..Default::default()
    };
    let mut race = Race::new(config, track);
    race.generate_vehicles();
    race.start_countdown();

    // one frame to clear the countdown, then 100 frames at rest
    run_frames(&mut race, 101);
    assert_eq!(race.vehicles[0].score, 0);
}

// ============================================================================
// Autopilot
// ============================================================================

#[test]
fn stuck_autopilot_teleports_once_to_current_waypoint() {
    let tuning = Tuning::default();
    let route = [Vec2::new(900.0, 0.0), Vec2::new(900.0, 900.0)];
    let mut car = Vehicle::new(3, "cpu".into(), Vec2::ZERO, 0.0, &tuning)
        .with_autopilot(AutopilotState::new(0, &tuning));

    let mut teleports = Vec::new();
    for frame in 0..(4 * 60) {
        // Pinned against an imaginary wall.
        car.position = Vec2::new(100.0, 0.0);
        car.velocity = Vec2::ZERO;
        let action = Autopilot::tick(&mut car, &route, DT, &tuning);
        if let AutopilotAction::Teleported { waypoint } = action {
            teleports.push(frame);
            assert_eq!(waypoint, 0);
            assert_eq!(car.position, route[0]);
            if let racer_lib::game_server::Control::Autopilot(state) = &car.control {
                assert_eq!(state.waypoint_index, 0);
            }
        }
    }
    assert_eq!(teleports.len(), 1, "teleported on frames {teleports:?}");
}

#[test]
fn autopilot_race_finishes_on_open_loop() {
    let config = RaceConfig {
        lap_target: 2,
        human_count: 0,
        autopilot_count: 1,
        countdown: 0.0,
        ..Default::default()
    };
    let mut race = Race::new(config, open_loop());
    race.generate_vehicles();
    race.start_countdown();

    for _ in 0..(60 * 120) {
        race.update(DT, &[]);
        if race.is_finished() {
            break;
        }
    }
    assert_eq!(race.status, RaceStatus::Finished);
    assert!(race.vehicles[0].score >= 2);
    assert_eq!(race.winner().unwrap().vehicle_id, 0);
}

// ============================================================================
// Full circuit
// ============================================================================

#[test]
fn demo_circuit_stays_numerically_sane() {
    let config = RaceConfig {
        countdown: 0.0,
        autopilot_count: 4,
        human_count: 0,
        ..Default::default()
    };
    let mut race = Race::new(config, Track::demo());
    race.generate_vehicles();
    race.start_countdown();
    run_frames(&mut race, 60 * 20);

    for vehicle in &race.vehicles {
        assert!(vehicle.position.is_finite() && vehicle.velocity.is_finite());
        assert!((0.0..360.0).contains(&vehicle.angle));
        assert!(vehicle.position.x > -100.0 && vehicle.position.x < 1380.0);
        assert!(vehicle.position.y > -100.0 && vehicle.position.y < 820.0);
        assert!(vehicle.power_penalty >= 1.0 && vehicle.power_penalty <= 2.5);
    }
}

#[test]
fn server_ticks_human_input_through_to_snapshot() {
    let mut server = GameServer::new();
    let config = RaceConfig {
        human_count: 1,
        autopilot_count: 0,
        countdown: 0.0,
        ..Default::default()
    };
    server.init_race(config, Track::demo()).unwrap();
    server.start_race();

    let throttle = [InputState {
        accelerate: true,
        ..Default::default()
    }];
    server.tick_with(DT, &throttle);
    let mut snapshot = None;
    for _ in 0..30 {
        snapshot = server.tick_with(DT, &throttle);
    }
    let snapshot = snapshot.unwrap();
    assert_eq!(server.get_state(), GameState::Racing);
    assert!(snapshot.vehicles[0].speed > 0.0);
    assert!(snapshot.vehicles[0].position.x > 500.0);
}

#[test]
fn headless_run_reports_a_winner() {
    let config = RaceConfig {
        lap_target: 1,
        human_count: 0,
        autopilot_count: 1,
        countdown: 0.0,
        ..Default::default()
    };
    let summary = racer_lib::run(RunOptions {
        config,
        track: open_loop(),
        fixed_dt: Some(DT),
        max_frames: 60 * 120,
    })
    .unwrap();
    assert!(summary.finished);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.stats.game_state, GameState::Results);
    // Crossing from the grid scores lap 0, the full loop scores lap 1.
    assert_eq!(summary.laps, vec![(0, 0), (0, 1)]);
}
