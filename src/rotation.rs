//! Rotating reference frames as pure functions of simulation time.
//!
//! Angles are never accumulated frame to frame: `angle = time / period * TAU`.
//! Scrubbing backwards to `t` therefore yields exactly the orientation that
//! forward playback had at `t`.

use std::f64::consts::TAU;

use bevy::prelude::*;

use crate::config::EngineConfig;

/// Rotation angle (radians, unwrapped) about the spin axis at `time`.
#[inline]
pub fn orientation(time: f64, period_secs: f64) -> f64 {
    time / period_secs * TAU
}

/// Spin about the body's `+Y` axis by an unwrapped angle.
#[inline]
pub fn spin(angle: f64) -> Quat {
    // Wrap in f64 first so large angles keep their precision in f32.
    Quat::from_rotation_y(angle.rem_euclid(TAU) as f32)
}

/// A layer that spins about the body axis with its own period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatingLayer {
    pub period_secs: f64,
}

impl RotatingLayer {
    pub fn new(period_secs: f64) -> Self {
        Self { period_secs }
    }

    pub fn body(config: &EngineConfig) -> Self {
        Self::new(config.body_rotation_period_secs)
    }

    pub fn clouds(config: &EngineConfig) -> Self {
        Self::new(config.cloud_rotation_period_secs)
    }

    #[inline]
    pub fn angle_at(&self, time: f64) -> f64 {
        orientation(time, self.period_secs)
    }

    pub fn pose_at(&self, time: f64) -> LayerPose {
        let angle = self.angle_at(time);
        LayerPose {
            angle,
            rotation: spin(angle),
        }
    }
}

/// Orientation of a rotating layer for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPose {
    /// Unwrapped angle in radians.
    pub angle: f64,
    pub rotation: Quat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_period_is_one_turn() {
        assert!((orientation(120.0, 120.0) - TAU).abs() < 1e-12);
        assert_eq!(orientation(0.0, 120.0), 0.0);
    }

    #[test]
    fn angle_is_linear_in_time() {
        let a = orientation(10.0, 60.0);
        let b = orientation(20.0, 60.0);
        assert!((b - 2.0 * a).abs() < 1e-12);
    }

    #[test]
    fn clouds_drift_relative_to_body() {
        let config = EngineConfig::default();
        let body = RotatingLayer::body(&config);
        let clouds = RotatingLayer::clouds(&config);
        assert!(clouds.angle_at(60.0) > body.angle_at(60.0));
    }

    #[test]
    fn spin_ignores_whole_turns() {
        let base = spin(0.7) * Vec3::X;
        let later = spin(0.7 + 1000.0 * TAU) * Vec3::X;
        assert!((base - later).length() < 1e-5, "{base} vs {later}");
    }

    #[test]
    fn pose_rotation_matches_angle() {
        let layer = RotatingLayer::new(97.0);
        let pose = layer.pose_at(24.25);
        let expected = Quat::from_rotation_y((24.25 / 97.0 * TAU) as f32);
        assert!((pose.rotation * Vec3::X - expected * Vec3::X).length() < 1e-6);
    }
}
