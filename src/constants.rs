//! Centralised timeline, kinematics and effect constants.
//!
//! Defaults for every runtime-tunable value in [`crate::config::EngineConfig`]
//! live here, next to the fixed effect phase boundaries which are deliberately
//! *not* tunable: the visual lifecycle of an impact must look the same in
//! every run.

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Upper bound of the scrubbable simulation clock (seconds).
pub const MAX_TIME_SECS: f64 = 300.0;

/// A-priori estimate of when the impact should occur (seconds).
///
/// Only used to normalise trajectory progress (`time / reference`); the
/// discovered event time comes from the trajectory itself.
pub const REFERENCE_EVENT_TIME_SECS: f64 = 100.0;

/// Playback speed multiplier applied on startup and after `reset`.
pub const DEFAULT_SPEED: f64 = 1.0;

// ── Bodies ────────────────────────────────────────────────────────────────────

/// Mean Earth radius (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius of the rotating body in scene units.
pub const BODY_RADIUS_UNITS: f32 = 1.0;

/// Simulated seconds for one full turn of the rotating body.
///
/// Visualisation rate, not the sidereal day: a real day would make the
/// rotation invisible over a few-minute impact timeline.
pub const BODY_ROTATION_PERIOD_SECS: f64 = 120.0;

/// Cloud layer turns slightly faster than the surface below it.
pub const CLOUD_ROTATION_PERIOD_SECS: f64 = 108.0;

/// Lift applied to surface-fixed artifacts so they do not z-fight the body.
pub const ARTIFACT_SURFACE_OFFSET_UNITS: f32 = 0.002;

// ── Fallback descent ──────────────────────────────────────────────────────────

/// Altitude at which the closed-form fallback descent starts (km).
///
/// Matches the start altitude the physics engine uses for its own
/// visualisation trajectories.
pub const FALLBACK_START_ALTITUDE_KM: f64 = 10_000.0;

/// Ground distance from the impact site at which the fallback descent starts (km).
pub const FALLBACK_START_DISTANCE_KM: f64 = 2_000.0;

// ── Orbit ─────────────────────────────────────────────────────────────────────

/// Scene units per astronomical unit for orbit geometry.
pub const ORBIT_UNITS_PER_AU: f64 = 10.0;

// ── Energy ────────────────────────────────────────────────────────────────────

/// Joules per megaton of TNT.
pub const JOULES_PER_MT_TNT: f64 = 4.184e15;

/// Floor applied to the impact energy before taking `log10` for the
/// shockwave rate, so tiny impactors still get a (slow) ring.
pub const SHOCKWAVE_ENERGY_FLOOR_MT: f64 = 0.1;

// ── Effect phases (elapsed seconds since impact) ──────────────────────────────

/// The flash is visible over `[0, FLASH_DURATION_SECS)`.
pub const FLASH_DURATION_SECS: f64 = 2.0;

/// Flash scale growth per second of elapsed time.
pub const FLASH_GROWTH_PER_SEC: f64 = 1.5;

/// The shockwave ring is visible over `[0, SHOCKWAVE_DURATION_SECS)`.
pub const SHOCKWAVE_DURATION_SECS: f64 = 30.0;

/// Ring radius growth per second before energy scaling (scene units).
pub const SHOCKWAVE_BASE_RATE: f64 = 0.01;

/// The crater bowl and rim scale from 0 to 1 over this window.
pub const CRATER_FORMATION_SECS: f64 = 5.0;

/// Ejecta blanket starts fading in here.
pub const EJECTA_START_SECS: f64 = 1.0;

/// Ejecta blanket reaches full scale here and then persists.
pub const EJECTA_FULL_SECS: f64 = 5.0;

/// Peak opacity of the ejecta blanket.
pub const EJECTA_MAX_OPACITY: f64 = 0.8;

/// Crater glow fades to zero over this window.
pub const CRATER_GLOW_DURATION_SECS: f64 = 30.0;
