//! Surface-fixed artifacts glued to a rotating body.
//!
//! At the discovered impact time the body's orientation is captured once
//! (the *frozen frame*) together with the crater site's world pose under that
//! orientation.  Every later evaluation only composes the rotation accumulated
//! since the event on top of the memo:
//!
//! ```text
//! delta    = angle(time) - angle(event_time)
//! position = spin(delta) * frozen.position
//! rotation = spin(delta) * frozen.rotation
//! ```
//!
//! The memo is the only state that outlives a frame.  It is dropped on
//! [`FrozenFrameProjector::invalidate`] and never rebuilt implicitly by the
//! clock.

use bevy::prelude::*;

use crate::geo::{surface_alignment, surface_point, ImpactLocation};
use crate::rotation::{spin, RotatingLayer};

/// One-time snapshot taken at the impact moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrozenFrame {
    pub event_time: f64,
    /// Body angle at `event_time` (radians, unwrapped).
    pub frozen_angle: f64,
    /// World position of the site at `event_time`.
    pub position: Vec3,
    /// World orientation of the site at `event_time`; local `+Y` is the surface normal.
    pub rotation: Quat,
}

/// Current world pose of a surface-fixed artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactPose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Seconds since the impact.
    pub elapsed: f64,
}

#[derive(Debug, Clone)]
pub struct FrozenFrameProjector {
    layer: RotatingLayer,
    surface_radius: f64,
    memo: Option<FrozenFrame>,
}

impl FrozenFrameProjector {
    pub fn new(layer: RotatingLayer, surface_radius: f64) -> Self {
        Self {
            layer,
            surface_radius,
            memo: None,
        }
    }

    #[inline]
    pub fn frozen(&self) -> Option<&FrozenFrame> {
        self.memo.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.memo = None;
    }

    /// Capture the frozen frame for an event, unless one is already held.
    ///
    /// Returns `true` when a new snapshot was taken.  An existing memo is kept
    /// as-is even if asked again; replacing it requires [`Self::invalidate`].
    pub fn capture(&mut self, event_time: f64, site: &ImpactLocation) -> bool {
        if self.memo.is_some() {
            return false;
        }
        let frozen_angle = self.layer.angle_at(event_time);
        let frame = spin(frozen_angle);
        let local = surface_point(site.latitude_deg, site.longitude_deg, self.surface_radius);
        self.memo = Some(FrozenFrame {
            event_time,
            frozen_angle,
            position: frame * local,
            rotation: frame * surface_alignment(site.latitude_deg, site.longitude_deg),
        });
        debug!(
            "Frozen frame captured at t={event_time:.3}s (angle {:.4} rad)",
            frozen_angle
        );
        true
    }

    /// Pose at `time`, or `None` before the event or without a memo.
    pub fn project(&self, time: f64) -> Option<ArtifactPose> {
        let memo = self.memo.as_ref()?;
        if time < memo.event_time {
            return None;
        }
        let delta = spin(self.layer.angle_at(time) - memo.frozen_angle);
        Some(ArtifactPose {
            position: delta * memo.position,
            rotation: delta * memo.rotation,
            elapsed: time - memo.event_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> FrozenFrameProjector {
        FrozenFrameProjector::new(RotatingLayer::new(120.0), 1.0)
    }

    #[test]
    fn nothing_before_capture() {
        assert_eq!(projector().project(500.0), None);
    }

    #[test]
    fn hidden_before_event_visible_after() {
        let mut p = projector();
        p.capture(100.0, &ImpactLocation::new(10.0, 20.0, 0.0));
        assert_eq!(p.project(99.999), None);
        let pose = p.project(100.0).expect("visible at the event time");
        assert_eq!(pose.elapsed, 0.0);
    }

    #[test]
    fn artifact_stays_on_the_rotating_site() {
        let site = ImpactLocation::new(-33.0, 151.0, 45.0);
        let layer = RotatingLayer::new(120.0);
        let mut p = FrozenFrameProjector::new(layer, 1.0);
        p.capture(40.0, &site);

        for time in [40.0, 55.5, 133.0, 260.0] {
            let pose = p.project(time).unwrap();
            // The live body frame applied to the body-fixed site.
            let live = spin(layer.angle_at(time))
                * surface_point(site.latitude_deg, site.longitude_deg, 1.0);
            assert!(
                (pose.position - live).length() < 1e-4,
                "drifted off site at t={time}: {} vs {live}",
                pose.position
            );
        }
    }

    #[test]
    fn capture_happens_once() {
        let mut p = projector();
        let site = ImpactLocation::new(0.0, 0.0, 0.0);
        assert!(p.capture(100.0, &site));
        let memo = *p.frozen().unwrap();
        assert!(!p.capture(150.0, &site), "second capture must be ignored");
        assert_eq!(*p.frozen().unwrap(), memo);
    }

    #[test]
    fn scrub_history_does_not_change_pose() {
        let mut p = projector();
        p.capture(100.0, &ImpactLocation::new(5.0, -60.0, 0.0));
        let direct = p.project(180.0);
        for t in [0.0, 250.0, 99.0, 101.0, 180.0, 10.0] {
            let _ = p.project(t);
        }
        assert_eq!(p.project(180.0), direct);
    }

    #[test]
    fn invalidate_drops_memo() {
        let mut p = projector();
        p.capture(100.0, &ImpactLocation::new(0.0, 0.0, 0.0));
        p.invalidate();
        assert!(p.frozen().is_none());
        assert_eq!(p.project(200.0), None);
        assert!(p.capture(120.0, &ImpactLocation::new(0.0, 0.0, 0.0)));
        assert_eq!(p.frozen().unwrap().event_time, 120.0);
    }
}
