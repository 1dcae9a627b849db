//! Trajectory samples and the nearest-index sampler.
//!
//! The physics engine hands over one [`Trajectory`] per simulation run: an
//! ordered, non-uniformly time-stamped list of kinematic samples.  The sampler
//! maps the clock onto that list with
//!
//! ```text
//! progress = clamp(time / reference_event_time, 0, 1)
//! index    = min(floor(progress * (N - 1)), N - 1)
//! ```
//!
//! No interpolation between neighbours: the result is a stateless step
//! function of `progress`, so a scrubbed lookup is bit-identical to the one
//! reached by sequential playback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, EngineResult};

/// One physics data point along the impactor's descent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub altitude_km: f64,
    pub velocity_km_s: f64,
    pub horizontal_distance_km: f64,
    /// Seconds since the start of the physics run, when the engine reports it.
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub time_s: Option<f64>,
}

impl TrajectorySample {
    pub fn new(altitude_km: f64, velocity_km_s: f64, horizontal_distance_km: f64) -> Self {
        Self {
            altitude_km,
            velocity_km_s,
            horizontal_distance_km,
            time_s: None,
        }
    }

    pub fn with_time(mut self, time_s: f64) -> Self {
        self.time_s = Some(time_s);
        self
    }

    fn validate(&self, index: usize) -> EngineResult<()> {
        let context = format!("trajectory[{index}]");
        ensure_finite(&context, "altitude_km", self.altitude_km)?;
        ensure_finite(&context, "velocity_km_s", self.velocity_km_s)?;
        ensure_finite(&context, "horizontal_distance_km", self.horizontal_distance_km)?;
        if let Some(t) = self.time_s {
            ensure_finite(&context, "time_s", t)?;
        }
        Ok(())
    }
}

/// Run-level summary the physics engine reports alongside the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryMetadata {
    pub impact_velocity_km_s: Option<f64>,
    /// Altitude at which the body broke up, when it did not reach the ground.
    pub airburst_altitude_km: Option<f64>,
    pub fragmented: bool,
}

/// Immutable trajectory for one run, tagged with the version the engine
/// assigned when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Arc<[TrajectorySample]>,
    metadata: TrajectoryMetadata,
    version: u64,
}

impl Trajectory {
    /// Validate and wrap a sample list.  An empty list is valid ("no data yet").
    pub fn new(
        samples: Vec<TrajectorySample>,
        metadata: TrajectoryMetadata,
        version: u64,
    ) -> EngineResult<Self> {
        for (index, sample) in samples.iter().enumerate() {
            sample.validate(index)?;
        }
        Ok(Self {
            samples: samples.into(),
            metadata,
            version,
        })
    }

    /// The "nothing received yet" trajectory.
    pub fn empty() -> Self {
        Self::cleared(0)
    }

    /// An empty trajectory that replaces earlier data under a new version.
    pub fn cleared(version: u64) -> Self {
        Self {
            samples: Arc::from(Vec::new()),
            metadata: TrajectoryMetadata::default(),
            version,
        }
    }

    #[inline]
    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    #[inline]
    pub fn metadata(&self) -> &TrajectoryMetadata {
        &self.metadata
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nearest-index lookup at `time`; see the module docs.
    pub fn sample_at(&self, time: f64, reference_event_time: f64) -> SampleLookup {
        sample_at(&self.samples, time, reference_event_time)
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::empty()
    }
}

/// Result of a sampler lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleLookup {
    /// No samples have arrived; callers fall back to [`fallback_descent`].
    NoData,
    Sample {
        index: usize,
        sample: TrajectorySample,
    },
}

/// Normalised trajectory progress in `[0, 1]`.
///
/// A non-positive reference duration means every instant is "at the end".
pub fn progress(time: f64, reference_event_time: f64) -> f64 {
    if reference_event_time > 0.0 {
        (time / reference_event_time).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

pub fn sample_at(
    samples: &[TrajectorySample],
    time: f64,
    reference_event_time: f64,
) -> SampleLookup {
    if samples.is_empty() {
        return SampleLookup::NoData;
    }
    let last = samples.len() - 1;
    let index = ((progress(time, reference_event_time) * last as f64).floor() as usize).min(last);
    SampleLookup::Sample {
        index,
        sample: samples[index],
    }
}

/// Closed-form straight-line descent used while no trajectory exists.
///
/// Altitude and ground distance shrink linearly with progress and hit zero at
/// `reference_event_time`.
pub fn fallback_descent(
    time: f64,
    reference_event_time: f64,
    start_altitude_km: f64,
    start_distance_km: f64,
) -> (f64, f64) {
    let remaining = 1.0 - progress(time, reference_event_time);
    (start_altitude_km * remaining, start_distance_km * remaining)
}

/// Where the impactor's kinematics came from this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KinematicSource {
    Sampled { index: usize },
    Fallback,
}

/// Impactor kinematics at one instant, from data or from the fallback model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPoint {
    pub altitude_km: f64,
    pub horizontal_distance_km: f64,
    /// Unknown under the fallback model.
    pub velocity_km_s: Option<f64>,
    pub source: KinematicSource,
}

impl KinematicPoint {
    pub fn resolve(
        trajectory: &Trajectory,
        time: f64,
        reference_event_time: f64,
        fallback_start_altitude_km: f64,
        fallback_start_distance_km: f64,
    ) -> Self {
        match trajectory.sample_at(time, reference_event_time) {
            SampleLookup::Sample { index, sample } => Self {
                altitude_km: sample.altitude_km,
                horizontal_distance_km: sample.horizontal_distance_km,
                velocity_km_s: Some(sample.velocity_km_s),
                source: KinematicSource::Sampled { index },
            },
            SampleLookup::NoData => {
                let (altitude_km, horizontal_distance_km) = fallback_descent(
                    time,
                    reference_event_time,
                    fallback_start_altitude_km,
                    fallback_start_distance_km,
                );
                Self {
                    altitude_km,
                    horizontal_distance_km,
                    velocity_km_s: None,
                    source: KinematicSource::Fallback,
                }
            }
        }
    }
}
