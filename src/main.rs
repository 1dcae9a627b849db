use std::env;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use impactscope::config::{self, EngineConfig};
use impactscope::scenario;
use impactscope::simulation::{
    sync_engine_config_system, ClockCommand, CurrentFrame, DataReplacement, ImpactTimelinePlugin,
};
use impactscope::testing::{self, TestConfig};

const DEFAULT_SCENARIO_PATH: &str = "assets/scenarios/demo.toml";

/// Simulated seconds between summary lines.
const SUMMARY_INTERVAL_SECS: f64 = 10.0;

/// Load the scenario named by `IMPACT_SCENARIO` (or the demo) and start
/// playback.  Without a scenario the fallback descent plays instead.
fn load_scenario_system(
    mut replacements: MessageWriter<DataReplacement>,
    mut commands: MessageWriter<ClockCommand>,
) {
    let path = env::var("IMPACT_SCENARIO").unwrap_or_else(|_| DEFAULT_SCENARIO_PATH.to_string());
    match scenario::load_scenario(&path) {
        Ok(loaded) => {
            println!("✓ Loaded scenario from {path}");
            replacements.write(DataReplacement::Scenario(Box::new(loaded)));
        }
        Err(e) => {
            eprintln!("⚠ {e}; playing fallback descent");
        }
    }
    commands.write(ClockCommand::Play);
}

/// Whether a summary is due at `time`.  A backward scrub re-arms the mark.
fn summary_due(time: f64, next_summary: &mut f64) -> bool {
    if time + SUMMARY_INTERVAL_SECS < *next_summary {
        *next_summary = time;
    }
    if time < *next_summary {
        return false;
    }
    *next_summary = time + SUMMARY_INTERVAL_SECS;
    true
}

fn log_frame_summary_system(current: Res<CurrentFrame>, mut next_summary: Local<f64>) {
    let Some(frame) = current.0.as_ref() else {
        return;
    };
    if !summary_due(frame.scene.time, &mut next_summary) {
        return;
    }

    let impactor = &frame.scene.impactor;
    info!(
        "t = {:6.1}s  alt = {:9.2} km  impactor = ({:.2}, {:.2})  visible = {}  impact = {:?}",
        frame.scene.time,
        impactor.kinematics.altitude_km,
        impactor.latitude_deg,
        impactor.longitude_deg,
        impactor.visible,
        frame.scene.impact_time,
    );
    if let Some(site) = frame.scene.crater_site {
        let effects = &frame.scene.effects;
        info!(
            "   crater +{:.1}s  scale = {:.2}  shockwave = {:.3}  glow = {:.2}",
            site.elapsed, effects.crater.scale, effects.shockwave.scale, effects.glow.opacity,
        );
    }
}

/// Playback pauses itself at the end of the timeline; that ends the run.
fn exit_at_end_system(current: Res<CurrentFrame>, mut exit: MessageWriter<AppExit>) {
    let Some(frame) = current.0.as_ref() else {
        return;
    };
    if !frame.clock.playing && frame.clock.time >= frame.clock.max_time {
        info!("Reached end of timeline at t = {:.1}s", frame.clock.time);
        exit.write(AppExit::Success);
    }
}

fn main() {
    // Check for test mode
    let test_mode = env::var("IMPACT_TEST").ok();

    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins(LogPlugin::default())
    // Insert EngineConfig with compiled defaults; load_engine_config will
    // overwrite it from assets/engine.toml (if present) in the Startup schedule.
    .insert_resource(EngineConfig::default())
    .add_plugins(ImpactTimelinePlugin)
    .add_systems(
        Startup,
        config::load_engine_config.before(sync_engine_config_system),
    );

    if let Some(test_name) = test_mode {
        let test_config = TestConfig {
            enabled: true,
            ..Default::default()
        };
        app.insert_resource(test_config);

        match test_name.as_str() {
            "scrub_determinism" => app.add_systems(
                Startup,
                testing::setup_scrub_determinism_test.after(sync_engine_config_system),
            ),
            other => {
                println!("Unknown test '{other}', running scrub_determinism");
                app.add_systems(
                    Startup,
                    testing::setup_scrub_determinism_test.after(sync_engine_config_system),
                )
            }
        };

        // Checks read the frame evaluated in Update.
        app.add_systems(
            PostUpdate,
            (
                testing::scrub_determinism_system,
                testing::test_verification_system,
            )
                .chain(),
        );

        println!("Running test: {}", test_name);
    } else {
        app.add_systems(
            Startup,
            load_scenario_system.after(sync_engine_config_system),
        )
        .add_systems(PostUpdate, (log_frame_summary_system, exit_at_end_system));
    }

    app.run();
}
