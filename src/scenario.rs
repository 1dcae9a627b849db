//! Versioned TOML scenario files.
//!
//! A scenario bundles everything the physics and orbital services would hand
//! the engine for one run: impactor parameters, the impact site, and
//! optionally a trajectory, an orbit, an energy figure and timeline bounds.
//!
//! ```toml
//! version = 1
//! energy_mt_tnt = 12.5
//!
//! [asteroid]
//! diameter_m = 120.0
//! velocity_km_s = 19.0
//! density_kg_m3 = 3000.0
//! angle_deg = 45.0
//!
//! [location]
//! latitude_deg = 21.3
//! longitude_deg = -89.5
//!
//! [[trajectory.samples]]
//! altitude_km = 100.0
//! velocity_km_s = 19.0
//! horizontal_distance_km = 140.0
//! time = 0.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asteroid::AsteroidParameters;
use crate::engine::ImpactEngine;
use crate::error::{ensure_positive, EngineError, EngineResult};
use crate::geo::ImpactLocation;
use crate::orbit::{OrbitMetadata, OrbitSample, OrbitalPath};
use crate::trajectory::{Trajectory, TrajectoryMetadata, TrajectorySample};

pub const SCENARIO_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimelineSnapshot {
    pub max_time_secs: f64,
    pub reference_event_time_secs: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrajectorySnapshot {
    #[serde(default)]
    pub metadata: TrajectoryMetadata,
    #[serde(default)]
    pub samples: Vec<TrajectorySample>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OrbitSnapshot {
    #[serde(default)]
    pub metadata: OrbitMetadata,
    #[serde(default)]
    pub samples: Vec<OrbitSample>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImpactScenario {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_mt_tnt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TimelineSnapshot>,
    #[serde(default)]
    pub asteroid: AsteroidParameters,
    #[serde(default)]
    pub location: ImpactLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<TrajectorySnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit: Option<OrbitSnapshot>,
}

impl Default for ImpactScenario {
    fn default() -> Self {
        Self {
            version: SCENARIO_VERSION,
            energy_mt_tnt: None,
            timeline: None,
            asteroid: AsteroidParameters::default(),
            location: ImpactLocation::default(),
            trajectory: None,
            orbit: None,
        }
    }
}

impl ImpactScenario {
    /// Check every part without touching an engine.
    pub fn validate(&self) -> EngineResult<()> {
        if let Some(timeline) = self.timeline {
            ensure_positive("max_time_secs", timeline.max_time_secs)?;
            ensure_positive(
                "reference_event_time_secs",
                timeline.reference_event_time_secs,
            )?;
        }
        if let Some(energy) = self.energy_mt_tnt {
            ensure_positive("energy_mt_tnt", energy)?;
        }
        self.asteroid.validate()?;
        self.location.validate()?;
        if let Some(trajectory) = &self.trajectory {
            Trajectory::new(trajectory.samples.clone(), trajectory.metadata, 0)?;
        }
        if let Some(orbit) = &self.orbit {
            OrbitalPath::new(orbit.samples.clone(), orbit.metadata, 1.0)?;
        }
        Ok(())
    }

    /// Replace the engine's inputs with this scenario's.
    ///
    /// The scenario is validated up front, so a bad file leaves the engine
    /// untouched.  Parts the scenario omits are cleared (trajectory, orbit,
    /// energy override) or left as they are (timeline).
    pub fn apply_to(&self, engine: &mut ImpactEngine) -> EngineResult<()> {
        self.validate()?;

        if let Some(timeline) = self.timeline {
            engine.set_timeline(timeline.max_time_secs, timeline.reference_event_time_secs)?;
        }
        engine.set_asteroid(self.asteroid)?;
        engine.set_location(self.location)?;
        engine.set_energy_override(self.energy_mt_tnt)?;

        match &self.trajectory {
            Some(trajectory) => {
                engine.load_trajectory(trajectory.samples.clone(), trajectory.metadata)?;
            }
            None => engine.clear_trajectory(),
        }
        match &self.orbit {
            Some(orbit) => engine.load_orbit(orbit.samples.clone(), orbit.metadata)?,
            None => engine.clear_orbit(),
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|err| EngineError::Parse {
            source_name: "<scenario>".to_string(),
            message: format!("failed to serialize scenario TOML: {err}"),
        })
    }
}

/// Parse and validate scenario text.  `source_name` labels errors.
pub fn parse_scenario(contents: &str, source_name: &str) -> EngineResult<ImpactScenario> {
    let parse_error = |message: String| EngineError::Parse {
        source_name: source_name.to_string(),
        message,
    };

    let mut value: toml::Value = toml::from_str(contents)
        .map_err(|err| parse_error(format!("failed to parse scenario TOML: {err}")))?;
    migrate_scenario_value(&mut value).map_err(parse_error)?;
    check_version(&value)?;

    let scenario = value
        .try_into::<ImpactScenario>()
        .map_err(|err| parse_error(format!("failed to decode scenario: {err}")))?;
    scenario.validate()?;
    Ok(scenario)
}

pub fn load_scenario(path: impl AsRef<Path>) -> EngineResult<ImpactScenario> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| EngineError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse_scenario(&contents, &path.display().to_string())
}

/// Hand-written files may omit the version; they are read as current.
fn migrate_scenario_value(value: &mut toml::Value) -> Result<(), String> {
    let table = value
        .as_table_mut()
        .ok_or_else(|| "scenario root must be a TOML table".to_string())?;

    if !table.contains_key("version") {
        table.insert(
            "version".to_string(),
            toml::Value::Integer(i64::from(SCENARIO_VERSION)),
        );
    }
    Ok(())
}

fn check_version(value: &toml::Value) -> EngineResult<()> {
    let found = value
        .get("version")
        .and_then(toml::Value::as_integer)
        .ok_or_else(|| EngineError::Parse {
            source_name: "<scenario>".to_string(),
            message: "scenario version is missing or invalid".to_string(),
        })?;

    if found != i64::from(SCENARIO_VERSION) {
        return Err(EngineError::UnsupportedVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            supported: SCENARIO_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [asteroid]
        diameter_m = 200.0
        velocity_km_s = 18.0
        density_kg_m3 = 3000.0
        angle_deg = 60.0

        [location]
        latitude_deg = 45.0
        longitude_deg = 10.0
    "#;

    const WITH_DATA: &str = r#"
        version = 1
        energy_mt_tnt = 50.0

        [timeline]
        max_time_secs = 200.0
        reference_event_time_secs = 80.0

        [asteroid]
        diameter_m = 200.0
        velocity_km_s = 18.0
        density_kg_m3 = 3000.0
        angle_deg = 60.0

        [location]
        latitude_deg = 45.0
        longitude_deg = 10.0
        azimuth_deg = 90.0

        [trajectory.metadata]
        impact_velocity_km_s = 17.2

        [[trajectory.samples]]
        altitude_km = 80.0
        velocity_km_s = 18.0
        horizontal_distance_km = 100.0
        time = 0.0

        [[trajectory.samples]]
        altitude_km = 20.0
        velocity_km_s = 17.8
        horizontal_distance_km = 30.0
        time = 40.0

        [[trajectory.samples]]
        altitude_km = 0.0
        velocity_km_s = 17.2
        horizontal_distance_km = 0.0
        time = 61.5

        [orbit.metadata]
        collision_detected = true
        collision_point_index = 1
        orbital_period_years = 1.4

        [[orbit.samples]]
        x = 1.0
        y = 0.0
        z = 0.0

        [[orbit.samples]]
        x = 0.0
        y = 1.2
        z = 0.1
        is_collision_zone = true
    "#;

    #[test]
    fn missing_version_is_read_as_current() {
        let scenario = parse_scenario(MINIMAL, "<inline>").expect("minimal scenario parses");
        assert_eq!(scenario.version, SCENARIO_VERSION);
        assert!(scenario.trajectory.is_none());
        assert_eq!(scenario.location.latitude_deg, 45.0);
    }

    #[test]
    fn future_version_is_rejected() {
        let text = format!("version = 7\n{MINIMAL}");
        let err = parse_scenario(&text, "<inline>").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedVersion {
                found: 7,
                supported: SCENARIO_VERSION
            }
        );
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let text = MINIMAL.replace("latitude_deg = 45.0", "latitude_deg = 95.0");
        assert!(matches!(
            parse_scenario(&text, "<inline>"),
            Err(EngineError::OutOfRange { .. })
        ));
    }

    #[test]
    fn full_scenario_drives_the_engine() {
        let scenario = parse_scenario(WITH_DATA, "<inline>").expect("scenario parses");
        let mut engine = ImpactEngine::default();
        scenario.apply_to(&mut engine).expect("scenario applies");

        assert_eq!(engine.clock().max_time(), 200.0);
        assert_eq!(engine.energy_mt_tnt(), 50.0);
        assert_eq!(engine.trajectory().len(), 3);

        // The crossing sample carries its own timestamp.
        let frame = engine.evaluate_at(0.0);
        assert_eq!(frame.scene.impact_time, Some(61.5));
        assert_eq!(frame.scene.trajectory_metadata.impact_velocity_km_s, Some(17.2));
        let orbit = frame.scene.orbit.expect("orbit loaded");
        assert!(orbit.collision_point.is_some());
    }

    #[test]
    fn scenario_without_trajectory_clears_previous_one() {
        let mut engine = ImpactEngine::default();
        parse_scenario(WITH_DATA, "<inline>")
            .unwrap()
            .apply_to(&mut engine)
            .unwrap();
        parse_scenario(MINIMAL, "<inline>")
            .unwrap()
            .apply_to(&mut engine)
            .unwrap();
        assert!(engine.trajectory().is_empty());
        assert!(engine.orbit().is_none());
        assert_eq!(engine.evaluate_at(150.0).scene.impact_time, None);
    }

    #[test]
    fn bad_trajectory_leaves_engine_untouched() {
        let mut engine = ImpactEngine::default();
        let mut scenario = parse_scenario(WITH_DATA, "<inline>").unwrap();
        if let Some(trajectory) = scenario.trajectory.as_mut() {
            trajectory.samples[1].altitude_km = f64::INFINITY;
        }
        assert!(scenario.apply_to(&mut engine).is_err());
        assert_eq!(engine.clock().max_time(), crate::constants::MAX_TIME_SECS);
        assert!(engine.trajectory().is_empty());
    }

    #[test]
    fn written_scenario_loads_back_from_disk() {
        let scenario = parse_scenario(WITH_DATA, "<inline>").unwrap();
        let path = std::env::temp_dir().join(format!(
            "impactscope_scenario_{}.toml",
            std::process::id()
        ));
        fs::write(&path, scenario.to_toml_string().unwrap()).unwrap();
        let loaded = load_scenario(&path).expect("written scenario loads");
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_scenario("does/not/exist.toml"),
            Err(EngineError::Io { .. })
        ));
    }
}
