//! Impact effect lifecycles.
//!
//! Each effect is a pure function of `elapsed = time - event_time` with fixed
//! phase boundaries from [`crate::constants`].  Negative elapsed time (before
//! the impact, or no impact at all) hides everything.
//!
//! | effect    | visible           | opacity              | scale                    |
//! |-----------|-------------------|----------------------|--------------------------|
//! | flash     | `[0, 2)`          | 1 → 0 linearly       | grows with elapsed       |
//! | shockwave | `[0, 30)`         | 1 → 0 linearly       | radius, energy-scaled    |
//! | crater    | `[0, ∞)`          | 1                    | 0 → 1 over `[0, 5)`      |
//! | ejecta    | `[1, ∞)`          | fades in until 5 s   | 0 → 1 over `[1, 5)`      |
//! | glow      | `[0, 30)`         | 1 → 0 linearly       | 1                        |

use crate::constants::*;

/// Render-facing state of one effect for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectState {
    pub visible: bool,
    pub opacity: f32,
    pub scale: f32,
}

impl EffectState {
    pub const HIDDEN: Self = Self {
        visible: false,
        opacity: 0.0,
        scale: 0.0,
    };

    fn shown(opacity: f64, scale: f64) -> Self {
        Self {
            visible: true,
            opacity: opacity as f32,
            scale: scale as f32,
        }
    }
}

/// `1 - elapsed / duration`, for elapsed already known to be in `[0, duration)`.
#[inline]
fn linear_fade(elapsed: f64, duration: f64) -> f64 {
    1.0 - elapsed / duration
}

/// Linear ramp from 0 at `start` to 1 at `end`, clamped.
#[inline]
fn ramp(elapsed: f64, start: f64, end: f64) -> f64 {
    ((elapsed - start) / (end - start)).clamp(0.0, 1.0)
}

pub fn flash(elapsed: f64) -> EffectState {
    if !(0.0..FLASH_DURATION_SECS).contains(&elapsed) {
        return EffectState::HIDDEN;
    }
    EffectState::shown(
        linear_fade(elapsed, FLASH_DURATION_SECS),
        1.0 + elapsed * FLASH_GROWTH_PER_SEC,
    )
}

/// Multiplier on the ring's growth rate: `log10(max(0.1, energy)) + 1`.
///
/// Zero at the 0.1 Mt floor, so a sub-floor impactor gets a ring that does
/// not grow.
pub fn shockwave_rate_factor(energy_mt_tnt: f64) -> f64 {
    energy_mt_tnt.max(SHOCKWAVE_ENERGY_FLOOR_MT).log10() + 1.0
}

pub fn shockwave(elapsed: f64, energy_mt_tnt: f64) -> EffectState {
    if !(0.0..SHOCKWAVE_DURATION_SECS).contains(&elapsed) {
        return EffectState::HIDDEN;
    }
    let radius = elapsed * SHOCKWAVE_BASE_RATE * shockwave_rate_factor(energy_mt_tnt);
    EffectState::shown(linear_fade(elapsed, SHOCKWAVE_DURATION_SECS), radius)
}

/// Crater bowl and rim: ramps in, then stays forever.
pub fn crater(elapsed: f64) -> EffectState {
    if elapsed < 0.0 {
        return EffectState::HIDDEN;
    }
    EffectState::shown(1.0, ramp(elapsed, 0.0, CRATER_FORMATION_SECS))
}

pub fn ejecta(elapsed: f64) -> EffectState {
    if elapsed < EJECTA_START_SECS {
        return EffectState::HIDDEN;
    }
    let t = ramp(elapsed, EJECTA_START_SECS, EJECTA_FULL_SECS);
    EffectState::shown(t * EJECTA_MAX_OPACITY, t)
}

pub fn crater_glow(elapsed: f64) -> EffectState {
    if !(0.0..CRATER_GLOW_DURATION_SECS).contains(&elapsed) {
        return EffectState::HIDDEN;
    }
    EffectState::shown(linear_fade(elapsed, CRATER_GLOW_DURATION_SECS), 1.0)
}

/// All effect states for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSet {
    pub flash: EffectState,
    pub shockwave: EffectState,
    pub crater: EffectState,
    pub ejecta: EffectState,
    pub glow: EffectState,
}

impl EffectSet {
    pub const HIDDEN: Self = Self {
        flash: EffectState::HIDDEN,
        shockwave: EffectState::HIDDEN,
        crater: EffectState::HIDDEN,
        ejecta: EffectState::HIDDEN,
        glow: EffectState::HIDDEN,
    };

    /// Evaluate every effect at `time` for an impact at `event_time`.
    /// No impact means everything is hidden.
    pub fn evaluate(time: f64, event_time: Option<f64>, energy_mt_tnt: f64) -> Self {
        let Some(event_time) = event_time else {
            return Self::HIDDEN;
        };
        let elapsed = time - event_time;
        Self {
            flash: flash(elapsed),
            shockwave: shockwave(elapsed, energy_mt_tnt),
            crater: crater(elapsed),
            ejecta: ejecta(elapsed),
            glow: crater_glow(elapsed),
        }
    }
}
