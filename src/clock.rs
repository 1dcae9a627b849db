//! Scrubbable simulation clock.
//!
//! The clock is the only accumulator in the engine: every other stage is a
//! pure function of [`SimulationClock::time`].  None of the operations fail;
//! out-of-range requests are clamped.

use crate::config::EngineConfig;
use bevy::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    time: f64,
    max_time: f64,
    reference_event_time: f64,
    playing: bool,
    speed: f64,
}

impl SimulationClock {
    pub fn new(max_time: f64, reference_event_time: f64, speed: f64) -> Self {
        Self {
            time: 0.0,
            max_time: max_time.max(0.0),
            reference_event_time,
            playing: false,
            speed,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.max_time_secs,
            config.reference_event_time_secs,
            config.default_speed,
        )
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    #[inline]
    pub fn reference_event_time(&self) -> f64 {
        self.reference_event_time
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Scrub to `t`, clamped into `[0, max_time]`.
    ///
    /// Landing on `max_time` while playing pauses playback, since playback
    /// only runs forward.  NaN is ignored.
    pub fn set_time(&mut self, t: f64) {
        if t.is_nan() {
            warn!("Ignoring NaN scrub request");
            return;
        }
        self.time = t.clamp(0.0, self.max_time);
        if self.playing && self.time >= self.max_time {
            self.playing = false;
        }
    }

    /// Advance by `delta_seconds * speed` while playing.
    ///
    /// A zero step leaves the clock alone (Bevy's first frame has no delta).
    /// Playback pauses only on the bound it moves towards.
    pub fn advance(&mut self, delta_seconds: f64) {
        let step = delta_seconds * self.speed;
        if !self.playing || !step.is_finite() || step == 0.0 {
            return;
        }
        self.time = (self.time + step).clamp(0.0, self.max_time);
        let reached_bound = if step > 0.0 {
            self.time >= self.max_time
        } else {
            self.time <= 0.0
        };
        if reached_bound {
            self.playing = false;
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Set the playback multiplier.  Non-positive or non-finite values are
    /// ignored and the previous speed stays in effect.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        } else {
            warn!("Ignoring invalid playback speed {speed}");
        }
    }

    /// Back to `t = 0`, paused.  The speed multiplier is kept.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.playing = false;
    }

    /// Replace the timeline bounds (new scenario), re-clamping the current time.
    pub fn set_bounds(&mut self, max_time: f64, reference_event_time: f64) {
        self.max_time = max_time.max(0.0);
        self.reference_event_time = reference_event_time;
        self.time = self.time.clamp(0.0, self.max_time);
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SimulationClock {
        SimulationClock::new(200.0, 100.0, 1.0)
    }

    #[test]
    fn scrub_is_clamped_into_bounds() {
        let mut c = clock();
        c.set_time(-5.0);
        assert_eq!(c.time(), 0.0);
        c.set_time(1e9);
        assert_eq!(c.time(), 200.0);
        c.set_time(42.5);
        assert_eq!(c.time(), 42.5);
    }

    #[test]
    fn advance_only_moves_while_playing() {
        let mut c = clock();
        c.advance(1.0);
        assert_eq!(c.time(), 0.0, "paused clock must not move");

        c.play();
        c.set_speed(4.0);
        c.advance(0.5);
        assert_eq!(c.time(), 2.0);
        assert!(c.is_playing());
    }

    #[test]
    fn reaching_max_time_pauses() {
        let mut c = clock();
        c.set_time(199.0);
        c.play();
        c.advance(10.0);
        assert_eq!(c.time(), 200.0);
        assert!(!c.is_playing(), "playback stops at the upper bound");
    }

    #[test]
    fn zero_delta_frame_does_not_stop_playback_from_start() {
        let mut c = clock();
        c.play();
        c.advance(0.0);
        assert!(c.is_playing(), "a zero-length frame must not pause at t = 0");
        c.advance(1.0);
        assert_eq!(c.time(), 1.0);
        assert!(c.is_playing());
    }

    #[test]
    fn reset_then_play_moves_forward() {
        let mut c = clock();
        c.set_time(80.0);
        c.reset();
        c.play();
        c.advance(0.0);
        c.advance(0.5);
        assert_eq!(c.time(), 0.5);
    }

    #[test]
    fn scrub_to_zero_keeps_playing() {
        let mut c = clock();
        c.set_time(50.0);
        c.play();
        c.set_time(0.0);
        assert!(c.is_playing());
        c.set_time(500.0);
        assert!(!c.is_playing(), "landing on max_time pauses");
    }

    #[test]
    fn negative_delta_pauses_at_zero() {
        let mut c = clock();
        c.set_time(1.0);
        c.play();
        c.advance(-3.0);
        assert_eq!(c.time(), 0.0);
        assert!(!c.is_playing(), "playback stops at the lower bound");
    }

    #[test]
    fn invalid_speed_is_ignored() {
        let mut c = clock();
        c.set_speed(8.0);
        c.set_speed(0.0);
        c.set_speed(-2.0);
        c.set_speed(f64::NAN);
        assert_eq!(c.speed(), 8.0);
    }

    #[test]
    fn reset_rewinds_and_pauses() {
        let mut c = clock();
        c.play();
        c.set_speed(16.0);
        c.advance(3.0);
        c.reset();
        assert_eq!(c.time(), 0.0);
        assert!(!c.is_playing());
        assert_eq!(c.speed(), 16.0);
    }

    #[test]
    fn shrinking_bounds_reclamps_time() {
        let mut c = clock();
        c.set_time(150.0);
        c.set_bounds(120.0, 60.0);
        assert_eq!(c.time(), 120.0);
        assert_eq!(c.reference_event_time(), 60.0);
    }
}
