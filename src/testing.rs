//! Headless verification modes for the timeline.
//!
//! Selected with `IMPACT_TEST=<name>` when running the binary.  A mode plays
//! a built-in scenario for a fixed number of frames, checks every frame and
//! prints a PASS/FAIL banner before exiting.
//!
//! `scrub_determinism`: playback is interrupted by seeded random scrubs and
//! speed changes; every frame is compared with a cold engine evaluated at the
//! same instant.

use std::io::Write;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::asteroid::AsteroidParameters;
use crate::engine::ImpactEngine;
use crate::geo::ImpactLocation;
use crate::orbit::{OrbitMetadata, OrbitSample};
use crate::scenario::{ImpactScenario, OrbitSnapshot, TrajectorySnapshot};
use crate::simulation::{ClockCommand, CurrentFrame, DataReplacement, TransitionLog};
use crate::trajectory::{TrajectoryMetadata, TrajectorySample};

/// Test configuration
#[derive(Resource)]
pub struct TestConfig {
    pub enabled: bool,
    pub test_name: String,
    pub frame_limit: u32,
    pub frame_count: u32,
    pub seed: u64,
    /// Frames compared against a cold evaluation.
    pub checks: u32,
    pub mismatches: u32,
    pub scrubs: u32,
    /// Scenario the test loaded, kept to build cold engines from.
    pub scenario: Option<ImpactScenario>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            test_name: String::new(),
            frame_limit: 600,
            frame_count: 0,
            seed: 0x1A7E_5C0E,
            checks: 0,
            mismatches: 0,
            scrubs: 0,
            scenario: None,
        }
    }
}

/// Time-stamped descent of 240 samples reaching the ground near 95 s, plus an
/// orbit that ends in a collision.
pub fn determinism_scenario() -> ImpactScenario {
    let count = 240;
    let samples = (0..count)
        .map(|i| {
            let f = i as f64 / (count - 1) as f64;
            // Slight wobble so the crossing is not at the last sample.
            let altitude = (120.0 * (1.0 - f * 1.05) + (f * 40.0).sin() * 0.3).max(0.0);
            TrajectorySample::new(altitude, 20.0 - 3.0 * f, 400.0 * (1.0 - f)).with_time(f * 100.0)
        })
        .collect();

    let orbit_samples: Vec<OrbitSample> = (0..90)
        .map(|i| {
            let a = f64::from(i) / 90.0 * std::f64::consts::TAU;
            OrbitSample::new(1.3 * a.cos(), 0.05 * a.sin(), 0.9 * a.sin())
        })
        .collect();

    ImpactScenario {
        energy_mt_tnt: Some(75.0),
        asteroid: AsteroidParameters {
            diameter_m: 260.0,
            velocity_km_s: 20.0,
            density_kg_m3: 2800.0,
            angle_deg: 40.0,
        },
        location: ImpactLocation::new(35.0, 139.0, 210.0),
        trajectory: Some(TrajectorySnapshot {
            metadata: TrajectoryMetadata {
                impact_velocity_km_s: Some(17.0),
                ..Default::default()
            },
            samples,
        }),
        orbit: Some(OrbitSnapshot {
            metadata: OrbitMetadata {
                collision_detected: true,
                collision_point_index: Some(61),
                orbital_period_years: 1.6,
            },
            samples: orbit_samples,
        }),
        ..Default::default()
    }
}

/// Startup: load the scenario and start playback.
pub fn setup_scrub_determinism_test(
    mut test_config: ResMut<TestConfig>,
    mut replacements: MessageWriter<DataReplacement>,
    mut commands: MessageWriter<ClockCommand>,
) {
    test_config.test_name = "scrub_determinism".to_string();
    test_config.frame_limit = 600;

    let scenario = determinism_scenario();
    replacements.write(DataReplacement::Scenario(Box::new(scenario.clone())));
    test_config.scenario = Some(scenario);

    commands.write(ClockCommand::SetSpeed(3.0));
    commands.write(ClockCommand::Play);

    println!("✓ Spawned test: scrub determinism (seed {:#x})", test_config.seed);
}

/// Compare the live frame with a cold evaluation, then maybe scrub.
pub fn scrub_determinism_system(
    mut test_config: ResMut<TestConfig>,
    engine: Res<ImpactEngine>,
    current: Res<CurrentFrame>,
    mut commands: MessageWriter<ClockCommand>,
    mut rng: Local<Option<StdRng>>,
) {
    if !test_config.enabled || test_config.frame_count >= test_config.frame_limit {
        return;
    }
    test_config.frame_count += 1;

    let Some(frame) = current.0.as_ref() else {
        return;
    };
    let Some(scenario) = test_config.scenario.as_ref() else {
        return;
    };

    let mut cold = ImpactEngine::new(engine.config().clone());
    if let Err(e) = scenario.apply_to(&mut cold) {
        println!("✗ scenario rejected by cold engine: {e}");
        test_config.mismatches += 1;
        return;
    }
    let expected = cold.evaluate_at(frame.scene.time).scene;
    test_config.checks += 1;
    if expected != frame.scene {
        test_config.mismatches += 1;
        println!(
            "  ✗ frame {} differs from cold evaluation at t={:.4}",
            test_config.frame_count, frame.scene.time
        );
    }

    let seed = test_config.seed;
    let rng = rng.get_or_insert_with(|| StdRng::seed_from_u64(seed));
    if rng.gen_bool(0.15) {
        let target = rng.gen_range(0.0..=frame.clock.max_time);
        commands.write(ClockCommand::SetTime(target));
        test_config.scrubs += 1;
    }
    if rng.gen_bool(0.05) {
        commands.write(ClockCommand::SetSpeed(rng.gen_range(0.25..8.0)));
    }
    if !frame.clock.playing {
        commands.write(ClockCommand::Play);
    }
}

/// Verify test results at the end
pub fn test_verification_system(
    test_config: Res<TestConfig>,
    log: Res<TransitionLog>,
    mut exit: MessageWriter<bevy::app::AppExit>,
) {
    if !test_config.enabled || test_config.frame_count != test_config.frame_limit {
        return;
    }

    println!("\n╔════════════════════════════════════════════╗");
    println!("║           TEST COMPLETE                    ║");
    println!("╚════════════════════════════════════════════╝");
    println!("Test: {}", test_config.test_name);
    println!("Frames: {}", test_config.frame_count);
    println!("Checks: {}", test_config.checks);
    println!("Scrubs: {}", test_config.scrubs);
    println!("Transitions: {}", log.len());

    if test_config.checks > 0 && test_config.mismatches == 0 {
        println!(
            "✓ PASS: {}: every frame matches a cold evaluation",
            test_config.test_name
        );
    } else {
        println!(
            "✗ FAIL: {}: {} mismatched frame(s)",
            test_config.test_name, test_config.mismatches
        );
    }

    let _ = std::io::stdout().flush();
    exit.write(bevy::app::AppExit::Success);
}
