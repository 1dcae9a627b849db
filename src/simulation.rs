//! Timeline plugin and systems for Bevy ECS.
//!
//! Collaborators talk to the engine through messages only: the UI writes
//! [`ClockCommand`]s, the physics and orbit services write
//! [`DataReplacement`]s, and observers read [`ImpactTransition`]s.  Each frame
//! the systems run in a fixed chain:
//!
//! 1. data replacements (so the frame never mixes new data with old events)
//! 2. clock commands
//! 3. clock advance by the real frame delta
//! 4. evaluation into [`CurrentFrame`], emitting transitions
//! 5. transition logging

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::asteroid::AsteroidParameters;
use crate::config::EngineConfig;
use crate::engine::{FrameState, ImpactEngine};
use crate::error::EngineResult;
use crate::geo::ImpactLocation;
use crate::impact::ImpactTransition;
use crate::orbit::{OrbitMetadata, OrbitSample};
use crate::scenario::ImpactScenario;
use crate::trajectory::{TrajectoryMetadata, TrajectorySample};

/// How many transitions [`TransitionLog`] keeps.
pub const TRANSITION_LOG_CAPACITY: usize = 32;

/// Playback control from the UI.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum ClockCommand {
    SetTime(f64),
    Play,
    Pause,
    SetSpeed(f64),
    Reset,
}

/// New external data.  Each variant replaces its target wholesale.
#[derive(Message, Debug, Clone)]
pub enum DataReplacement {
    Trajectory {
        samples: Vec<TrajectorySample>,
        metadata: TrajectoryMetadata,
    },
    ClearTrajectory,
    Orbit {
        samples: Vec<OrbitSample>,
        metadata: OrbitMetadata,
    },
    ClearOrbit,
    Asteroid(AsteroidParameters),
    EnergyOverride(Option<f64>),
    Location(ImpactLocation),
    Timeline {
        max_time_secs: f64,
        reference_event_time_secs: f64,
    },
    Scenario(Box<ImpactScenario>),
}

/// Show or hide the orbit loop.  The marker keeps following the clock.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOrbitPath(pub bool);

/// Latest evaluated frame; `None` until the first `Update`.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct CurrentFrame(pub Option<FrameState>);

/// Line-strip mesh of the current orbit, rebuilt only when the orbit changes.
#[derive(Resource, Debug, Clone, Default)]
pub struct OrbitLine(pub Option<Mesh>);

/// Most recent impact transitions, oldest first.
#[derive(Resource, Debug, Clone, Default)]
pub struct TransitionLog {
    entries: VecDeque<ImpactTransition>,
}

impl TransitionLog {
    pub fn push(&mut self, transition: ImpactTransition) {
        if self.entries.len() == TRANSITION_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(transition);
    }

    pub fn entries(&self) -> impl Iterator<Item = &ImpactTransition> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ImpactTransition> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ImpactTimelinePlugin;

impl Plugin for ImpactTimelinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EngineConfig>()
            .init_resource::<ImpactEngine>()
            .init_resource::<CurrentFrame>()
            .init_resource::<OrbitLine>()
            .init_resource::<TransitionLog>()
            .add_message::<ClockCommand>()
            .add_message::<DataReplacement>()
            .add_message::<ShowOrbitPath>()
            .add_message::<ImpactTransition>()
            .add_systems(Startup, sync_engine_config_system)
            .add_systems(
                Update,
                (
                    apply_data_replacements_system,
                    apply_clock_commands_system,
                    advance_clock_system,
                    evaluate_frame_system,
                    log_transitions_system,
                )
                    .chain(),
            );
    }
}

/// Rebuild the engine when the config resource differs from the one it was
/// built with.  Runs after [`crate::config::load_engine_config`] at startup.
pub fn sync_engine_config_system(config: Res<EngineConfig>, mut engine: ResMut<ImpactEngine>) {
    if engine.config() != &*config {
        *engine = ImpactEngine::new(config.clone());
        debug!("Engine rebuilt from loaded config");
    }
}

fn apply_replacement(
    engine: &mut ImpactEngine,
    replacement: &DataReplacement,
) -> EngineResult<()> {
    match replacement {
        DataReplacement::Trajectory { samples, metadata } => {
            engine.load_trajectory(samples.clone(), *metadata)?;
        }
        DataReplacement::ClearTrajectory => engine.clear_trajectory(),
        DataReplacement::Orbit { samples, metadata } => {
            engine.load_orbit(samples.clone(), *metadata)?;
        }
        DataReplacement::ClearOrbit => engine.clear_orbit(),
        DataReplacement::Asteroid(asteroid) => engine.set_asteroid(*asteroid)?,
        DataReplacement::EnergyOverride(energy) => engine.set_energy_override(*energy)?,
        DataReplacement::Location(location) => engine.set_location(*location)?,
        DataReplacement::Timeline {
            max_time_secs,
            reference_event_time_secs,
        } => engine.set_timeline(*max_time_secs, *reference_event_time_secs)?,
        DataReplacement::Scenario(scenario) => scenario.apply_to(engine)?,
    }
    Ok(())
}

/// Swap in new data.  Rejected data is logged and the previous data stays.
pub fn apply_data_replacements_system(
    mut replacements: MessageReader<DataReplacement>,
    mut toggles: MessageReader<ShowOrbitPath>,
    mut engine: ResMut<ImpactEngine>,
    mut orbit_line: ResMut<OrbitLine>,
) {
    let mut orbit_changed = false;
    for replacement in replacements.read() {
        match apply_replacement(&mut engine, replacement) {
            Ok(()) => {
                orbit_changed |= matches!(
                    replacement,
                    DataReplacement::Orbit { .. }
                        | DataReplacement::ClearOrbit
                        | DataReplacement::Scenario(_)
                );
            }
            Err(e) => warn!("Rejected data replacement: {e}"),
        }
    }
    if orbit_changed {
        orbit_line.0 = engine.orbit().map(|orbit| orbit.line_strip_mesh());
    }

    for ShowOrbitPath(show) in toggles.read() {
        engine.set_show_orbit_path(*show);
    }
}

pub fn apply_clock_commands_system(
    mut commands: MessageReader<ClockCommand>,
    mut engine: ResMut<ImpactEngine>,
) {
    for command in commands.read() {
        match *command {
            ClockCommand::SetTime(t) => engine.set_time(t),
            ClockCommand::Play => engine.play(),
            ClockCommand::Pause => engine.pause(),
            ClockCommand::SetSpeed(speed) => engine.set_speed(speed),
            ClockCommand::Reset => engine.reset(),
        }
    }
}

pub fn advance_clock_system(time: Res<Time>, mut engine: ResMut<ImpactEngine>) {
    engine.advance(time.delta_secs_f64());
}

pub fn evaluate_frame_system(
    mut engine: ResMut<ImpactEngine>,
    mut current: ResMut<CurrentFrame>,
    mut transitions: MessageWriter<ImpactTransition>,
) {
    let frame = engine.evaluate();
    for transition in engine.drain_transitions() {
        transitions.write(transition);
    }
    current.0 = Some(frame);
}

pub fn log_transitions_system(
    mut transitions: MessageReader<ImpactTransition>,
    mut log: ResMut<TransitionLog>,
) {
    for transition in transitions.read() {
        match *transition {
            ImpactTransition::Discovered {
                trajectory_version,
                event_time,
                sample_index,
                time_source,
            } => info!(
                "Impact discovered: trajectory v{trajectory_version}, sample {sample_index}, t = {event_time:.2}s ({time_source:?})"
            ),
            ImpactTransition::NotOccurred {
                trajectory_version,
                sample_count,
                min_altitude_km,
            } => info!(
                "No impact: trajectory v{trajectory_version} ({sample_count} samples) bottoms out at {min_altitude_km:.3} km"
            ),
            ImpactTransition::Invalidated {
                trajectory_version,
                previous_event_time,
            } => info!(
                "Impact at t = {previous_event_time:.2}s invalidated (trajectory v{trajectory_version})"
            ),
        }
        log.push(*transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descent(n: usize) -> Vec<TrajectorySample> {
        (0..n)
            .map(|i| {
                let f = 1.0 - i as f64 / (n - 1) as f64;
                TrajectorySample::new(80.0 * f, 20.0, 200.0 * f)
            })
            .collect()
    }

    fn timeline_world() -> World {
        let mut world = World::new();
        world.insert_resource(ImpactEngine::default());
        world.init_resource::<CurrentFrame>();
        world.init_resource::<OrbitLine>();
        world.init_resource::<TransitionLog>();
        world.init_resource::<Messages<ClockCommand>>();
        world.init_resource::<Messages<DataReplacement>>();
        world.init_resource::<Messages<ShowOrbitPath>>();
        world.init_resource::<Messages<ImpactTransition>>();
        world
    }

    /// Reused across frames so message cursors persist, as in a real app.
    fn frame_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                apply_data_replacements_system,
                apply_clock_commands_system,
                evaluate_frame_system,
                log_transitions_system,
            )
                .chain(),
        );
        schedule
    }

    #[test]
    fn clock_commands_are_applied_in_order() {
        let mut world = timeline_world();
        let mut frame_schedule = frame_schedule();
        {
            let mut commands = world.resource_mut::<Messages<ClockCommand>>();
            commands.write(ClockCommand::SetSpeed(2.0));
            commands.write(ClockCommand::SetTime(50.0));
            commands.write(ClockCommand::Play);
            commands.write(ClockCommand::SetSpeed(-1.0));
        }
        frame_schedule.run(&mut world);

        let frame = world.resource::<CurrentFrame>().0.clone().expect("frame");
        assert_eq!(frame.clock.time, 50.0);
        assert_eq!(frame.clock.speed, 2.0, "invalid speed is ignored");
        assert!(frame.clock.playing);
    }

    #[test]
    fn trajectory_message_leads_to_discovery_in_same_frame() {
        let mut world = timeline_world();
        let mut frame_schedule = frame_schedule();
        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::Trajectory {
                samples: descent(11),
                metadata: TrajectoryMetadata::default(),
            });
        frame_schedule.run(&mut world);

        let frame = world.resource::<CurrentFrame>().0.clone().expect("frame");
        assert_eq!(frame.scene.impact_time, Some(100.0));
        let log = world.resource::<TransitionLog>();
        assert!(matches!(
            log.last(),
            Some(ImpactTransition::Discovered {
                trajectory_version: 1,
                ..
            })
        ));
    }

    #[test]
    fn rejected_trajectory_keeps_previous_event() {
        let mut world = timeline_world();
        let mut frame_schedule = frame_schedule();
        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::Trajectory {
                samples: descent(11),
                metadata: TrajectoryMetadata::default(),
            });
        frame_schedule.run(&mut world);

        let mut bad = descent(11);
        bad[4].horizontal_distance_km = f64::NAN;
        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::Trajectory {
                samples: bad,
                metadata: TrajectoryMetadata::default(),
            });
        frame_schedule.run(&mut world);

        let frame = world.resource::<CurrentFrame>().0.clone().expect("frame");
        assert_eq!(frame.scene.impact_time, Some(100.0));
        assert_eq!(world.resource::<TransitionLog>().len(), 1);
    }

    #[test]
    fn orbit_line_follows_orbit_replacements() {
        let mut world = timeline_world();
        let mut frame_schedule = frame_schedule();
        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::Orbit {
                samples: vec![
                    OrbitSample::new(1.0, 0.0, 0.0),
                    OrbitSample::new(0.0, 1.0, 0.0),
                    OrbitSample::new(-1.0, 0.0, 0.0),
                ],
                metadata: OrbitMetadata::default(),
            });
        frame_schedule.run(&mut world);
        let vertices = world
            .resource::<OrbitLine>()
            .0
            .as_ref()
            .map(|mesh| mesh.count_vertices());
        assert_eq!(vertices, Some(4));

        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::ClearOrbit);
        frame_schedule.run(&mut world);
        assert!(world.resource::<OrbitLine>().0.is_none());
    }

    #[test]
    fn orbit_toggle_hides_path_only() {
        let mut world = timeline_world();
        let mut frame_schedule = frame_schedule();
        world
            .resource_mut::<Messages<DataReplacement>>()
            .write(DataReplacement::Orbit {
                samples: vec![
                    OrbitSample::new(1.0, 0.0, 0.0),
                    OrbitSample::new(0.0, 1.0, 0.0),
                ],
                metadata: OrbitMetadata::default(),
            });
        world
            .resource_mut::<Messages<ShowOrbitPath>>()
            .write(ShowOrbitPath(false));
        frame_schedule.run(&mut world);

        let frame = world.resource::<CurrentFrame>().0.clone().expect("frame");
        let orbit = frame.scene.orbit.expect("orbit present");
        assert!(orbit.path.is_none());
        assert!(orbit.marker.is_some());
    }

    #[test]
    fn advance_uses_frame_delta_and_speed() {
        let mut world = timeline_world();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_millis(500));
        world.insert_resource(time);
        {
            let mut engine = world.resource_mut::<ImpactEngine>();
            engine.set_speed(4.0);
            engine.play();
        }

        let mut schedule = Schedule::default();
        schedule.add_systems(advance_clock_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<ImpactEngine>().clock().time(), 2.0);
    }

    #[test]
    fn play_from_zero_survives_first_empty_frame() {
        let mut world = timeline_world();
        world.insert_resource(Time::<()>::default());
        world.resource_mut::<ImpactEngine>().play();

        let mut schedule = Schedule::default();
        schedule.add_systems(advance_clock_system);

        // First frame: no delta yet.
        schedule.run(&mut world);
        let clock = world.resource::<ImpactEngine>().clock().clone();
        assert_eq!(clock.time(), 0.0);
        assert!(clock.is_playing(), "empty frame must not pause playback");

        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(250));
        schedule.run(&mut world);
        let clock = world.resource::<ImpactEngine>().clock().clone();
        assert_eq!(clock.time(), 0.25);
        assert!(clock.is_playing());
    }

    #[test]
    fn loaded_config_rebuilds_engine() {
        let mut world = World::new();
        world.insert_resource(ImpactEngine::default());
        world.insert_resource(EngineConfig {
            max_time_secs: 42.0,
            ..Default::default()
        });

        let mut schedule = Schedule::default();
        schedule.add_systems(sync_engine_config_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<ImpactEngine>().clock().max_time(), 42.0);
    }

    #[test]
    fn transition_log_drops_oldest() {
        let mut log = TransitionLog::default();
        for version in 0..(TRANSITION_LOG_CAPACITY as u64 + 5) {
            log.push(ImpactTransition::Invalidated {
                trajectory_version: version,
                previous_event_time: 1.0,
            });
        }
        assert_eq!(log.len(), TRANSITION_LOG_CAPACITY);
        assert!(matches!(
            log.entries().next(),
            Some(ImpactTransition::Invalidated {
                trajectory_version: 5,
                ..
            })
        ));
    }
}
