//! Impact event detection.
//!
//! The detector scans a trajectory in sequence order for the first sample at
//! or below the contact radius.  Results are cached against the inputs that
//! produced them; when any of them changes the previous result is thrown away
//! and the scan runs cold.  The clock never moves the detector backwards:
//! scrubbing below the event time leaves the event discovered.
//!
//! ```text
//! Undiscovered ──[trajectory has a crossing sample]──▶ Discovered(event_time)
//!      ▲                                                     │
//!      └────────────[new trajectory / radius]────────────────┘
//! ```
//!
//! Every state change is reported as an [`ImpactTransition`], which the
//! simulation plugin forwards as a Bevy message.

use bevy::prelude::*;

use crate::trajectory::{Trajectory, TrajectorySample};

/// Contact radius in km for an impactor of `diameter_m` metres.
#[inline]
pub fn contact_radius_km(diameter_m: f64) -> f64 {
    diameter_m / 2000.0
}

/// How the event time of a crossing was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTimeSource {
    /// The crossing sample carried its own `time_s`.
    SampleTimestamp,
    /// Reconstructed as `index / (N - 1) * reference_event_time`.
    SampleIndex,
}

/// The first sample at or below the contact radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactCrossing {
    pub sample_index: usize,
    pub event_time: f64,
    pub altitude_km: f64,
    pub time_source: EventTimeSource,
}

/// Canonical event time for the sample at `index`.
///
/// The sample's own timestamp wins whenever it exists; index-based
/// reconstruction is only used for samples without one.  Every call site in
/// the engine goes through here.
pub fn event_time_for(
    samples: &[TrajectorySample],
    index: usize,
    reference_event_time: f64,
) -> (f64, EventTimeSource) {
    if let Some(t) = samples.get(index).and_then(|s| s.time_s) {
        return (t, EventTimeSource::SampleTimestamp);
    }
    let time = if samples.len() <= 1 {
        reference_event_time
    } else {
        index as f64 / (samples.len() - 1) as f64 * reference_event_time
    };
    (time, EventTimeSource::SampleIndex)
}

/// First-crossing scan.  Non-monotonic altitude data is not smoothed or
/// re-sorted: the first sample in sequence order that touches the radius wins.
pub fn detect_first_crossing(
    samples: &[TrajectorySample],
    contact_radius_km: f64,
    reference_event_time: f64,
) -> Option<ImpactCrossing> {
    let sample_index = samples
        .iter()
        .position(|s| s.altitude_km <= contact_radius_km)?;
    let (event_time, time_source) = event_time_for(samples, sample_index, reference_event_time);
    Some(ImpactCrossing {
        sample_index,
        event_time,
        altitude_km: samples[sample_index].altitude_km,
        time_source,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DetectorState {
    #[default]
    Undiscovered,
    Discovered(ImpactCrossing),
}

/// State-machine transition emitted by [`ImpactDetector`].
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum ImpactTransition {
    Discovered {
        trajectory_version: u64,
        event_time: f64,
        sample_index: usize,
        time_source: EventTimeSource,
    },
    /// A non-empty trajectory was scanned and never reaches the surface.
    NotOccurred {
        trajectory_version: u64,
        sample_count: usize,
        min_altitude_km: f64,
    },
    /// A previously discovered event was discarded because its inputs changed.
    Invalidated {
        trajectory_version: u64,
        previous_event_time: f64,
    },
}

/// Inputs a detection result is valid for.  Floats are compared bitwise so
/// that a refresh with identical inputs is always a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DetectorKey {
    trajectory_version: u64,
    contact_radius_bits: u64,
    reference_bits: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ImpactDetector {
    key: Option<DetectorKey>,
    state: DetectorState,
}

impl ImpactDetector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn crossing(&self) -> Option<ImpactCrossing> {
        match self.state {
            DetectorState::Discovered(crossing) => Some(crossing),
            DetectorState::Undiscovered => None,
        }
    }

    #[inline]
    pub fn event_time(&self) -> Option<f64> {
        self.crossing().map(|c| c.event_time)
    }

    /// Drop the cached result.  Reports `Invalidated` when an event was known.
    pub fn invalidate(&mut self) -> Option<ImpactTransition> {
        let previous = self.crossing();
        let trajectory_version = self.key.map_or(0, |k| k.trajectory_version);
        self.key = None;
        self.state = DetectorState::Undiscovered;
        previous.map(|c| ImpactTransition::Invalidated {
            trajectory_version,
            previous_event_time: c.event_time,
        })
    }

    /// Bring the detector up to date with the current inputs.
    ///
    /// A cache hit does nothing and returns no transitions.  A miss discards
    /// the previous result and rescans from scratch.
    pub fn refresh(
        &mut self,
        trajectory: &Trajectory,
        contact_radius_km: f64,
        reference_event_time: f64,
    ) -> Vec<ImpactTransition> {
        let key = DetectorKey {
            trajectory_version: trajectory.version(),
            contact_radius_bits: contact_radius_km.to_bits(),
            reference_bits: reference_event_time.to_bits(),
        };
        if self.key == Some(key) {
            return Vec::new();
        }

        let mut transitions: Vec<ImpactTransition> = self.invalidate().into_iter().collect();
        self.key = Some(key);

        let samples = trajectory.samples();
        match detect_first_crossing(samples, contact_radius_km, reference_event_time) {
            Some(crossing) => {
                self.state = DetectorState::Discovered(crossing);
                transitions.push(ImpactTransition::Discovered {
                    trajectory_version: trajectory.version(),
                    event_time: crossing.event_time,
                    sample_index: crossing.sample_index,
                    time_source: crossing.time_source,
                });
            }
            None if !samples.is_empty() => {
                let min_altitude_km = samples
                    .iter()
                    .map(|s| s.altitude_km)
                    .fold(f64::INFINITY, f64::min);
                transitions.push(ImpactTransition::NotOccurred {
                    trajectory_version: trajectory.version(),
                    sample_count: samples.len(),
                    min_altitude_km,
                });
            }
            None => {}
        }
        transitions
    }
}
