//! Impact site geodesy in the body-fixed frame.
//!
//! Body-fixed axes: `+Y` through the north pole, longitude 0 on `+X`, and
//! positive longitude turning towards `-Z`.  With this convention a positive
//! rotation about `+Y` increases longitude, so the rotating frame and the
//! geographic grid agree.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, EngineError, EngineResult};

/// Where the impactor hits and the compass direction it travels in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    /// Direction of travel, degrees clockwise from north.
    #[serde(default)]
    pub azimuth_deg: f64,
}

impl ImpactLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            azimuth_deg,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        ensure_finite("location", "latitude_deg", self.latitude_deg)?;
        ensure_finite("location", "longitude_deg", self.longitude_deg)?;
        ensure_finite("location", "azimuth_deg", self.azimuth_deg)?;
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(EngineError::OutOfRange {
                name: "latitude_deg",
                value: self.latitude_deg,
                expected: "[-90.0, 90.0]",
            });
        }
        Ok(())
    }

    /// Ground position of the impactor `distance_km` before it reaches the
    /// site, i.e. walking back along the reverse of the travel azimuth.
    pub fn approach_point(&self, distance_km: f64, earth_radius_km: f64) -> (f64, f64) {
        destination(
            self.latitude_deg,
            self.longitude_deg,
            self.azimuth_deg + 180.0,
            distance_km,
            earth_radius_km,
        )
    }
}

impl Default for ImpactLocation {
    fn default() -> Self {
        // Chicxulub, travelling north-west
        Self::new(21.3, -89.5, 330.0)
    }
}

/// Great-circle destination from a start point, bearing and ground distance.
///
/// Returns `(latitude_deg, longitude_deg)` with longitude wrapped to `(-180, 180]`.
pub fn destination(
    latitude_deg: f64,
    longitude_deg: f64,
    bearing_deg: f64,
    distance_km: f64,
    radius_km: f64,
) -> (f64, f64) {
    let lat1 = latitude_deg.to_radians();
    let lon1 = longitude_deg.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / radius_km;

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * sin_lat2);

    (lat2.to_degrees(), wrap_longitude(lon2.to_degrees()))
}

fn wrap_longitude(lon_deg: f64) -> f64 {
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Body-fixed position of a lat/lon point at `radius` scene units.
pub fn surface_point(latitude_deg: f64, longitude_deg: f64, radius: f64) -> Vec3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    Vec3::new(
        (radius * lat.cos() * lon.cos()) as f32,
        (radius * lat.sin()) as f32,
        (-radius * lat.cos() * lon.sin()) as f32,
    )
}

/// Rotation taking local `+Y` onto the outward surface normal at a lat/lon.
pub fn surface_alignment(latitude_deg: f64, longitude_deg: f64) -> Quat {
    let normal = surface_point(latitude_deg, longitude_deg, 1.0).normalize();
    Quat::from_rotation_arc(Vec3::Y, normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f64 = 6371.0;

    #[test]
    fn zero_distance_is_identity() {
        let (lat, lon) = destination(40.0, -75.0, 123.0, 0.0, R);
        assert!((lat - 40.0).abs() < 1e-9);
        assert!((lon + 75.0).abs() < 1e-9);
    }

    #[test]
    fn due_north_along_meridian_adds_latitude() {
        // One degree of arc along a meridian.
        let arc_km = R * 1f64.to_radians();
        let (lat, lon) = destination(10.0, 20.0, 0.0, arc_km, R);
        assert!((lat - 11.0).abs() < 1e-9, "lat = {lat}");
        assert!((lon - 20.0).abs() < 1e-9, "lon = {lon}");
    }

    #[test]
    fn approach_point_lies_behind_direction_of_travel() {
        let site = ImpactLocation::new(0.0, 0.0, 90.0); // heading east
        let (lat, lon) = site.approach_point(500.0, R);
        assert!(lat.abs() < 1e-9);
        assert!(lon < 0.0, "impactor should approach from the west, lon = {lon}");
    }

    #[test]
    fn longitude_wraps_across_dateline() {
        let arc_km = R * 2f64.to_radians();
        let (_, lon) = destination(0.0, 179.0, 90.0, arc_km, R);
        assert!((lon + 179.0).abs() < 1e-9, "lon = {lon}");
    }

    #[test]
    fn surface_point_axes() {
        let north = surface_point(90.0, 0.0, 2.0);
        assert!((north - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        let east = surface_point(0.0, 90.0, 1.0);
        assert!((east - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn positive_y_rotation_increases_longitude() {
        let p = surface_point(0.0, 10.0, 1.0);
        let rotated = Quat::from_rotation_y(20f32.to_radians()) * p;
        let expected = surface_point(0.0, 30.0, 1.0);
        assert!((rotated - expected).length() < 1e-5);
    }

    #[test]
    fn alignment_points_up_axis_along_normal() {
        let q = surface_alignment(45.0, -30.0);
        let up = q * Vec3::Y;
        let normal = surface_point(45.0, -30.0, 1.0).normalize();
        assert!((up - normal).length() < 1e-5);
    }

    #[test]
    fn latitude_outside_poles_is_rejected() {
        assert!(ImpactLocation::new(91.0, 0.0, 0.0).validate().is_err());
        assert!(ImpactLocation::new(-90.0, 0.0, 0.0).validate().is_ok());
    }
}
