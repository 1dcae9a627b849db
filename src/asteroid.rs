//! Impactor physical parameters.
//!
//! The asteroid's size is what the impact detector cares about: half the
//! diameter is the contact radius below which the body is considered to have
//! hit the surface.  Its kinetic energy scales the shockwave ring.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::JOULES_PER_MT_TNT;
use crate::error::{ensure_finite, ensure_positive, EngineError, EngineResult};
use crate::impact::contact_radius_km;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsteroidParameters {
    pub diameter_m: f64,
    pub velocity_km_s: f64,
    pub density_kg_m3: f64,
    /// Entry angle from horizontal.
    pub angle_deg: f64,
}

impl Default for AsteroidParameters {
    fn default() -> Self {
        Self {
            diameter_m: 100.0,
            velocity_km_s: 20.0,
            density_kg_m3: 2500.0,
            angle_deg: 45.0,
        }
    }
}

impl AsteroidParameters {
    pub fn validate(&self) -> EngineResult<()> {
        ensure_positive("diameter_m", self.diameter_m)?;
        ensure_positive("velocity_km_s", self.velocity_km_s)?;
        ensure_positive("density_kg_m3", self.density_kg_m3)?;
        ensure_finite("asteroid", "angle_deg", self.angle_deg)?;
        if self.angle_deg <= 0.0 || self.angle_deg > 90.0 {
            return Err(EngineError::OutOfRange {
                name: "angle_deg",
                value: self.angle_deg,
                expected: "(0.0, 90.0]",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn contact_radius_km(&self) -> f64 {
        contact_radius_km(self.diameter_m)
    }

    /// Mass of a uniform sphere of this diameter and density.
    pub fn mass_kg(&self) -> f64 {
        let radius = self.diameter_m / 2.0;
        4.0 / 3.0 * PI * radius.powi(3) * self.density_kg_m3
    }

    pub fn kinetic_energy_j(&self) -> f64 {
        let v = self.velocity_km_s * 1000.0;
        0.5 * self.mass_kg() * v * v
    }

    pub fn kinetic_energy_mt_tnt(&self) -> f64 {
        self.kinetic_energy_j() / JOULES_PER_MT_TNT
    }
}
