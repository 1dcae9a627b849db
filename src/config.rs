//! Runtime engine configuration loaded from `assets/engine.toml`.
//!
//! [`EngineConfig`] is a Bevy [`Resource`] that mirrors the tunable constants
//! in [`crate::constants`].  At startup, [`load_engine_config`] reads
//! `assets/engine.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! Effect phase boundaries are not part of the config; they are fixed in
//! `src/constants.rs`.

use crate::constants::*;
use crate::error::{ensure_finite, ensure_positive, EngineError, EngineResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Default location of the config file, relative to the working directory.
pub const ENGINE_CONFIG_PATH: &str = "assets/engine.toml";

/// Runtime-tunable timeline and kinematics configuration.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ── Clock ─────────────────────────────────────────────────────────────────
    pub max_time_secs: f64,
    pub reference_event_time_secs: f64,
    pub default_speed: f64,

    // ── Bodies ────────────────────────────────────────────────────────────────
    pub earth_radius_km: f64,
    pub body_radius_units: f32,
    pub body_rotation_period_secs: f64,
    pub cloud_rotation_period_secs: f64,
    pub artifact_surface_offset_units: f32,

    // ── Fallback descent ──────────────────────────────────────────────────────
    pub fallback_start_altitude_km: f64,
    pub fallback_start_distance_km: f64,

    // ── Orbit ─────────────────────────────────────────────────────────────────
    pub orbit_units_per_au: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Clock
            max_time_secs: MAX_TIME_SECS,
            reference_event_time_secs: REFERENCE_EVENT_TIME_SECS,
            default_speed: DEFAULT_SPEED,
            // Bodies
            earth_radius_km: EARTH_RADIUS_KM,
            body_radius_units: BODY_RADIUS_UNITS,
            body_rotation_period_secs: BODY_ROTATION_PERIOD_SECS,
            cloud_rotation_period_secs: CLOUD_ROTATION_PERIOD_SECS,
            artifact_surface_offset_units: ARTIFACT_SURFACE_OFFSET_UNITS,
            // Fallback descent
            fallback_start_altitude_km: FALLBACK_START_ALTITUDE_KM,
            fallback_start_distance_km: FALLBACK_START_DISTANCE_KM,
            // Orbit
            orbit_units_per_au: ORBIT_UNITS_PER_AU,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the timeline or the frames degenerate.
    ///
    /// Rotation periods divide the clock, so zero would produce infinite
    /// angles; a zero `max_time_secs` would pin the clock at 0.
    pub fn validate(&self) -> EngineResult<()> {
        ensure_positive("max_time_secs", self.max_time_secs)?;
        ensure_positive("reference_event_time_secs", self.reference_event_time_secs)?;
        ensure_positive("default_speed", self.default_speed)?;
        ensure_positive("earth_radius_km", self.earth_radius_km)?;
        ensure_positive("body_radius_units", f64::from(self.body_radius_units))?;
        ensure_positive("body_rotation_period_secs", self.body_rotation_period_secs)?;
        ensure_positive("cloud_rotation_period_secs", self.cloud_rotation_period_secs)?;
        ensure_positive("fallback_start_altitude_km", self.fallback_start_altitude_km)?;
        ensure_positive("orbit_units_per_au", self.orbit_units_per_au)?;
        if !self.fallback_start_distance_km.is_finite() || self.fallback_start_distance_km < 0.0 {
            return Err(EngineError::OutOfRange {
                name: "fallback_start_distance_km",
                value: self.fallback_start_distance_km,
                expected: "[0.0, ∞)",
            });
        }
        let offset = f64::from(self.artifact_surface_offset_units);
        ensure_finite("engine config", "artifact_surface_offset_units", offset)?;
        if f64::from(self.body_radius_units) + offset <= 0.0 {
            return Err(EngineError::OutOfRange {
                name: "artifact_surface_offset_units",
                value: offset,
                expected: "greater than -body_radius_units",
            });
        }
        Ok(())
    }

    /// Parse a TOML document, keeping defaults for missing keys.
    pub fn from_toml_str(contents: &str, source_name: &str) -> EngineResult<Self> {
        let config =
            toml::from_str::<EngineConfig>(contents).map_err(|e| EngineError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

/// Startup system: attempt to load `assets/engine.toml` and overwrite the
/// `EngineConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse or validation errors
/// are reported but do not abort; a missing file is silently ignored.
pub fn load_engine_config(mut config: ResMut<EngineConfig>) {
    let path = ENGINE_CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match EngineConfig::from_toml_str(&contents, path) {
            Ok(loaded) => {
                *config = loaded;
                println!("✓ Loaded engine config from {path}");
            }
            Err(e) => {
                eprintln!("⚠ {e}; using defaults");
            }
        },
        Err(_) => {
            println!("ℹ No {path} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str("max_time_secs = 600.0\n", "<inline>")
            .expect("partial config should parse");
        assert_eq!(config.max_time_secs, 600.0);
        assert_eq!(
            config.body_rotation_period_secs,
            BODY_ROTATION_PERIOD_SECS,
            "untouched keys keep compiled defaults"
        );
    }

    #[test]
    fn zero_rotation_period_is_rejected() {
        let err = EngineConfig::from_toml_str("body_rotation_period_secs = 0.0\n", "<inline>")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::OutOfRange {
                name: "body_rotation_period_secs",
                ..
            }
        ));
    }

    #[test]
    fn syntax_error_reports_source() {
        let err = EngineConfig::from_toml_str("max_time_secs = ", "engine.toml").unwrap_err();
        assert!(err.to_string().contains("engine.toml"));
    }

    #[test]
    fn surface_offset_must_keep_artifacts_outside_the_body() {
        let err = EngineConfig::from_toml_str("artifact_surface_offset_units = -1.5\n", "<inline>")
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::OutOfRange {
                name: "artifact_surface_offset_units",
                ..
            }
        ));
        let nan = EngineConfig {
            artifact_surface_offset_units: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(EngineError::NonFinite {
                field: "artifact_surface_offset_units",
                ..
            })
        ));
    }
}
