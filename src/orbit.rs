//! Orbital path resolver.
//!
//! Orbit samples arrive as a whole from the orbital mechanics service.  An
//! [`OrbitalPath`] turns them into a closed loop for continuous rendering
//! once, at construction.  New elements replace the path wholesale: there is
//! no incremental patching, so the cached geometry is dropped in O(1) with
//! the old value.

use std::sync::Arc;

use bevy::math::DVec3;
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::PrimitiveTopology;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, EngineError, EngineResult};

/// One heliocentric position along the orbit (AU).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_anomaly_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_sun_au: Option<f64>,
    #[serde(default)]
    pub is_collision_zone: bool,
}

impl OrbitSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            mean_anomaly_deg: None,
            distance_from_sun_au: None,
            is_collision_zone: false,
        }
    }

    #[inline]
    pub fn position_au(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// Run-level metadata reported with the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitMetadata {
    pub collision_detected: bool,
    pub collision_point_index: Option<usize>,
    pub orbital_period_years: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalPath {
    samples: Arc<[OrbitSample]>,
    metadata: OrbitMetadata,
    /// Scene-space loop; last point repeats the first when the input was open.
    closed_loop: Arc<[Vec3]>,
}

impl OrbitalPath {
    pub fn new(
        samples: Vec<OrbitSample>,
        metadata: OrbitMetadata,
        units_per_au: f64,
    ) -> EngineResult<Self> {
        for (index, sample) in samples.iter().enumerate() {
            let context = format!("orbit[{index}]");
            ensure_finite(&context, "x", sample.x)?;
            ensure_finite(&context, "y", sample.y)?;
            ensure_finite(&context, "z", sample.z)?;
        }
        ensure_positive("orbit_units_per_au", units_per_au)?;
        if let Some(index) = metadata.collision_point_index {
            if index >= samples.len() {
                return Err(EngineError::OutOfRange {
                    name: "collision_point_index",
                    value: index as f64,
                    expected: "an index into the orbit samples",
                });
            }
        }
        let closed_loop = close_loop(&samples, units_per_au);
        Ok(Self {
            samples: samples.into(),
            metadata,
            closed_loop,
        })
    }

    #[inline]
    pub fn samples(&self) -> &[OrbitSample] {
        &self.samples
    }

    #[inline]
    pub fn metadata(&self) -> &OrbitMetadata {
        &self.metadata
    }

    /// Closed loop in scene units, shared without copying.
    #[inline]
    pub fn closed_loop(&self) -> Arc<[Vec3]> {
        Arc::clone(&self.closed_loop)
    }

    /// Scene position of the reported collision point, if any.
    pub fn collision_point(&self) -> Option<Vec3> {
        if !self.metadata.collision_detected {
            return None;
        }
        self.metadata
            .collision_point_index
            .and_then(|i| self.closed_loop.get(i).copied())
    }

    /// Marker travelling along the open path as `progress` goes 0 → 1.
    ///
    /// With a detected collision the marker stops at the collision point
    /// instead of completing the orbit.  Nearest-index, like the trajectory
    /// sampler.
    pub fn marker_at(&self, progress: f64) -> Option<Vec3> {
        if self.samples.is_empty() {
            return None;
        }
        let last = match (
            self.metadata.collision_detected,
            self.metadata.collision_point_index,
        ) {
            (true, Some(index)) => index,
            _ => self.samples.len() - 1,
        };
        let index = ((progress.clamp(0.0, 1.0) * last as f64).floor() as usize).min(last);
        self.closed_loop.get(index).copied()
    }

    /// Line-strip mesh of the closed loop for the rendering layer.
    pub fn line_strip_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.closed_loop.iter().map(|p| p.to_array()).collect();
        Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    }
}

fn close_loop(samples: &[OrbitSample], units_per_au: f64) -> Arc<[Vec3]> {
    let mut points: Vec<Vec3> = samples
        .iter()
        .map(|s| (s.position_au() * units_per_au).as_vec3())
        .collect();
    let first = samples.first().map(OrbitSample::position_au);
    let last = samples.last().map(OrbitSample::position_au);
    if samples.len() > 1 && first != last {
        points.push(points[0]);
    }
    points.into()
}
