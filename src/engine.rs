//! Top-level controller for the time-synchronized kinematics engine.
//!
//! [`ImpactEngine`] owns the clock and all input data.  Once per tick it is
//! evaluated in a fixed order:
//!
//! 1. clock value (read once, shared by every stage)
//! 2. trajectory sampler → impactor kinematics
//! 3. impact detector (cached on trajectory version + contact radius)
//! 4. frozen-frame projector (one-time memo at the event)
//! 5. effect lifecycles
//!
//! and the result is handed out as an immutable [`FrameState`].  Apart from
//! the detector cache and the frozen-frame memo nothing depends on how the
//! clock got to its current value.
//!
//! Every data replacement (trajectory, asteroid, impact site, timeline)
//! invalidates the derived state inside the same call, so a frame can never
//! combine new data with a stale frozen frame.

use std::sync::Arc;

use bevy::prelude::*;

use crate::asteroid::AsteroidParameters;
use crate::clock::SimulationClock;
use crate::config::EngineConfig;
use crate::effects::EffectSet;
use crate::error::{ensure_positive, EngineResult};
use crate::frozen_frame::{ArtifactPose, FrozenFrameProjector};
use crate::geo::{surface_point, ImpactLocation};
use crate::impact::{ImpactCrossing, ImpactDetector, ImpactTransition};
use crate::orbit::{OrbitMetadata, OrbitSample, OrbitalPath};
use crate::rotation::{LayerPose, RotatingLayer};
use crate::trajectory::{
    progress, KinematicPoint, Trajectory, TrajectoryMetadata, TrajectorySample,
};

/// Clock values for UI display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReadout {
    pub time: f64,
    pub max_time: f64,
    pub playing: bool,
    pub speed: f64,
}

/// The moving impactor for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactorState {
    /// Hidden from the impact moment on.
    pub visible: bool,
    /// World position (body frame rotated by the live body orientation).
    pub position: Vec3,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub kinematics: KinematicPoint,
}

/// Orbit data for one frame.  Present only when an orbit is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitFrame {
    /// Closed loop, only when the path toggle is on.
    pub path: Option<Arc<[Vec3]>>,
    pub marker: Option<Vec3>,
    pub collision_point: Option<Vec3>,
    pub period_years: f64,
}

/// Everything derived from the clock value.  Two evaluations at the same
/// time with the same inputs produce equal scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub time: f64,
    pub body: LayerPose,
    pub clouds: LayerPose,
    pub impactor: ImpactorState,
    /// Crater site pose; `None` before the impact or when none occurs.
    pub crater_site: Option<ArtifactPose>,
    pub effects: EffectSet,
    pub impact_time: Option<f64>,
    pub energy_mt_tnt: f64,
    /// Run summary reported with the current trajectory.
    pub trajectory_metadata: TrajectoryMetadata,
    pub orbit: Option<OrbitFrame>,
}

/// Per-frame output handed to the rendering and UI collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub clock: ClockReadout,
    pub scene: SceneState,
}

#[derive(Resource, Debug, Clone)]
pub struct ImpactEngine {
    config: EngineConfig,
    clock: SimulationClock,
    trajectory: Trajectory,
    last_trajectory_version: u64,
    asteroid: AsteroidParameters,
    energy_override_mt: Option<f64>,
    location: ImpactLocation,
    body: RotatingLayer,
    clouds: RotatingLayer,
    detector: ImpactDetector,
    projector: FrozenFrameProjector,
    orbit: Option<OrbitalPath>,
    show_orbit_path: bool,
    pending: Vec<ImpactTransition>,
}

impl ImpactEngine {
    pub fn new(config: EngineConfig) -> Self {
        let body = RotatingLayer::body(&config);
        let surface_radius =
            f64::from(config.body_radius_units + config.artifact_surface_offset_units);
        Self {
            clock: SimulationClock::from_config(&config),
            trajectory: Trajectory::empty(),
            last_trajectory_version: 0,
            asteroid: AsteroidParameters::default(),
            energy_override_mt: None,
            location: ImpactLocation::default(),
            body,
            clouds: RotatingLayer::clouds(&config),
            detector: ImpactDetector::new(),
            projector: FrozenFrameProjector::new(body, surface_radius),
            orbit: None,
            show_orbit_path: true,
            pending: Vec::new(),
            config,
        }
    }

    // ── Read access ───────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    #[inline]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    #[inline]
    pub fn asteroid(&self) -> &AsteroidParameters {
        &self.asteroid
    }

    #[inline]
    pub fn location(&self) -> &ImpactLocation {
        &self.location
    }

    #[inline]
    pub fn orbit(&self) -> Option<&OrbitalPath> {
        self.orbit.as_ref()
    }

    /// The detected crossing, as of the last evaluation.
    pub fn impact(&self) -> Option<ImpactCrossing> {
        self.detector.crossing()
    }

    /// Energy driving the shockwave: the physics engine's figure when one was
    /// supplied, otherwise the impactor's kinetic energy.
    pub fn energy_mt_tnt(&self) -> f64 {
        self.energy_override_mt
            .unwrap_or_else(|| self.asteroid.kinetic_energy_mt_tnt())
    }

    // ── Clock control surface ─────────────────────────────────────────────────

    pub fn set_time(&mut self, t: f64) {
        self.clock.set_time(t);
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.clock.set_speed(speed);
    }

    pub fn reset(&mut self) {
        self.clock.reset();
    }

    /// Periodic tick with the real frame delta.
    pub fn advance(&mut self, delta_seconds: f64) {
        self.clock.advance(delta_seconds);
    }

    // ── Data replacement ──────────────────────────────────────────────────────

    /// Swap in a new trajectory.  The previous impact event and frozen frame
    /// are discarded in the same call.  Invalid samples leave everything as it
    /// was.
    pub fn load_trajectory(
        &mut self,
        samples: Vec<TrajectorySample>,
        metadata: TrajectoryMetadata,
    ) -> EngineResult<u64> {
        let version = self.last_trajectory_version + 1;
        let trajectory = Trajectory::new(samples, metadata, version)?;
        info!(
            "Trajectory v{version} loaded ({} samples)",
            trajectory.len()
        );
        self.last_trajectory_version = version;
        self.trajectory = trajectory;
        self.invalidate_impact();
        Ok(version)
    }

    /// Back to "no data yet"; the impactor falls back to the closed-form descent.
    pub fn clear_trajectory(&mut self) {
        self.last_trajectory_version += 1;
        self.trajectory = Trajectory::cleared(self.last_trajectory_version);
        self.invalidate_impact();
    }

    /// New impactor parameters.  A different diameter changes the contact
    /// radius and so invalidates the impact event.
    pub fn set_asteroid(&mut self, asteroid: AsteroidParameters) -> EngineResult<()> {
        asteroid.validate()?;
        let radius_changed = asteroid.contact_radius_km() != self.asteroid.contact_radius_km();
        self.asteroid = asteroid;
        if radius_changed {
            self.invalidate_impact();
        }
        Ok(())
    }

    /// Energy reported by the physics engine, or `None` to derive it.
    pub fn set_energy_override(&mut self, energy_mt_tnt: Option<f64>) -> EngineResult<()> {
        if let Some(e) = energy_mt_tnt {
            ensure_positive("energy_mt_tnt", e)?;
        }
        self.energy_override_mt = energy_mt_tnt;
        Ok(())
    }

    /// Move the impact site.  The event time is unaffected but the frozen
    /// frame captured the old site and must be rebuilt.
    pub fn set_location(&mut self, location: ImpactLocation) -> EngineResult<()> {
        location.validate()?;
        self.location = location;
        self.projector.invalidate();
        Ok(())
    }

    /// Replace the timeline bounds.  A new reference duration changes
    /// index-derived event times, which the detector picks up on its own.
    pub fn set_timeline(&mut self, max_time: f64, reference_event_time: f64) -> EngineResult<()> {
        ensure_positive("max_time_secs", max_time)?;
        ensure_positive("reference_event_time_secs", reference_event_time)?;
        self.clock.set_bounds(max_time, reference_event_time);
        Ok(())
    }

    pub fn load_orbit(
        &mut self,
        samples: Vec<OrbitSample>,
        metadata: OrbitMetadata,
    ) -> EngineResult<()> {
        let path = OrbitalPath::new(samples, metadata, self.config.orbit_units_per_au)?;
        info!(
            "Orbit loaded ({} samples, collision: {})",
            path.samples().len(),
            metadata.collision_detected
        );
        self.orbit = Some(path);
        Ok(())
    }

    pub fn clear_orbit(&mut self) {
        self.orbit = None;
    }

    pub fn set_show_orbit_path(&mut self, show: bool) {
        self.show_orbit_path = show;
    }

    /// Transitions emitted since the last drain, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<ImpactTransition> {
        std::mem::take(&mut self.pending)
    }

    fn invalidate_impact(&mut self) {
        self.pending.extend(self.detector.invalidate());
        self.projector.invalidate();
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Bring the detector and frozen frame up to date with the current inputs.
    fn sync_impact(&mut self) {
        let transitions = self.detector.refresh(
            &self.trajectory,
            self.asteroid.contact_radius_km(),
            self.clock.reference_event_time(),
        );
        if !transitions.is_empty() {
            self.projector.invalidate();
        }
        self.pending.extend(transitions);
        if let Some(crossing) = self.detector.crossing() {
            self.projector.capture(crossing.event_time, &self.location);
        }
    }

    /// Evaluate the frame at the clock's current time.
    pub fn evaluate(&mut self) -> FrameState {
        let time = self.clock.time();
        self.evaluate_at(time)
    }

    /// Evaluate the scene at an arbitrary time without moving the clock.
    pub fn evaluate_at(&mut self, time: f64) -> FrameState {
        self.sync_impact();
        FrameState {
            clock: ClockReadout {
                time: self.clock.time(),
                max_time: self.clock.max_time(),
                playing: self.clock.is_playing(),
                speed: self.clock.speed(),
            },
            scene: self.scene_at(time),
        }
    }

    fn scene_at(&self, time: f64) -> SceneState {
        let reference = self.clock.reference_event_time();
        let body = self.body.pose_at(time);
        let impact_time = self.detector.event_time();
        let energy_mt_tnt = self.energy_mt_tnt();

        SceneState {
            time,
            body,
            clouds: self.clouds.pose_at(time),
            impactor: self.impactor_at(time, reference, &body, impact_time),
            crater_site: self.projector.project(time),
            effects: EffectSet::evaluate(time, impact_time, energy_mt_tnt),
            impact_time,
            energy_mt_tnt,
            trajectory_metadata: *self.trajectory.metadata(),
            orbit: self.orbit_at(time),
        }
    }

    fn impactor_at(
        &self,
        time: f64,
        reference: f64,
        body: &LayerPose,
        impact_time: Option<f64>,
    ) -> ImpactorState {
        let kinematics = KinematicPoint::resolve(
            &self.trajectory,
            time,
            reference,
            self.config.fallback_start_altitude_km,
            self.config.fallback_start_distance_km,
        );
        let (latitude_deg, longitude_deg) = self
            .location
            .approach_point(kinematics.horizontal_distance_km, self.config.earth_radius_km);
        let radius = f64::from(self.config.body_radius_units)
            * (1.0 + kinematics.altitude_km.max(0.0) / self.config.earth_radius_km);

        ImpactorState {
            visible: impact_time.is_none_or(|e| time < e),
            position: body.rotation * surface_point(latitude_deg, longitude_deg, radius),
            latitude_deg,
            longitude_deg,
            kinematics,
        }
    }

    fn orbit_at(&self, time: f64) -> Option<OrbitFrame> {
        let orbit = self.orbit.as_ref()?;
        Some(OrbitFrame {
            path: self.show_orbit_path.then(|| orbit.closed_loop()),
            marker: orbit.marker_at(progress(time, self.clock.max_time())),
            collision_point: orbit.collision_point(),
            period_years: orbit.metadata().orbital_period_years,
        })
    }
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
