//! Peak Limiter
//!
//! Brick-wall true-peak safety stage: the last thing in the chain before
//! output. No look-ahead — attack is instantaneous (the very first sample
//! of an overshoot is already brought under the ceiling), release is a
//! one-pole ramp back toward unity.
//!
//! # Lifecycle
//! - **Active**: normal operation.
//! - **Bypassed**: passed through unchanged; running without the limiter
//!   is the caller's decision to make, not this module's.

use crate::math::smooth_coef;

const DEFAULT_CEILING_DB: f32 = -0.5;
const RELEASE_MS: f32 = 50.0;

/// Peak-hold brick-wall limiter, shared across channels via a single
/// cross-channel envelope so the stereo image is preserved.
pub struct Limiter {
    ceiling_linear: f32,
    envelope: f32,
    release_coef: f32,
}

impl Limiter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            ceiling_linear: crate::math::db_to_linear(DEFAULT_CEILING_DB),
            envelope: 1.0,
            release_coef: smooth_coef(RELEASE_MS, sample_rate),
        }
    }

    pub fn set_ceiling_db(&mut self, ceiling_db: f32) {
        self.ceiling_linear = crate::math::db_to_linear(ceiling_db);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.release_coef = smooth_coef(RELEASE_MS, sample_rate);
    }

    /// Compute the linear gain to apply to every channel for one frame,
    /// given the cross-channel peak magnitude of that frame. The ceiling
    /// is never exceeded on the same sample that triggers the overshoot.
    #[inline]
    pub fn process_frame(&mut self, cross_channel_peak: f32) -> f32 {
        let required_gain = if cross_channel_peak > self.ceiling_linear {
            self.ceiling_linear / cross_channel_peak.max(1e-9)
        } else {
            1.0
        };

        if required_gain < self.envelope {
            // Instant attack: never let a sample through above the ceiling.
            self.envelope = required_gain;
        } else {
            self.envelope += self.release_coef * (1.0 - self.envelope);
            self.envelope = self.envelope.min(1.0);
        }

        self.envelope
    }

    pub fn gain_reduction_db(&self) -> f32 {
        -crate::math::linear_to_db(self.envelope)
    }

    pub fn reset(&mut self) {
        self.envelope = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_ceiling_signal_passes_at_unity() {
        let mut lim = Limiter::new(48_000.0);
        for _ in 0..100 {
            let g = lim.process_frame(0.1);
            assert!((g - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn overshoot_is_caught_on_first_sample() {
        let mut lim = Limiter::new(48_000.0);
        let peak = 2.0;
        let g = lim.process_frame(peak);
        assert!(peak * g <= lim.ceiling_linear + 1e-6);
    }

    #[test]
    fn envelope_releases_back_toward_unity_after_overshoot() {
        let mut lim = Limiter::new(48_000.0);
        lim.process_frame(2.0);
        let reduced = lim.envelope;
        for _ in 0..4000 {
            lim.process_frame(0.1);
        }
        assert!(lim.envelope > reduced);
        assert!(lim.envelope <= 1.0);
    }

    #[test]
    fn reset_restores_unity_envelope() {
        let mut lim = Limiter::new(48_000.0);
        lim.process_frame(5.0);
        lim.reset();
        assert_eq!(lim.envelope, 1.0);
    }

    #[test]
    fn custom_ceiling_is_honored() {
        let mut lim = Limiter::new(48_000.0);
        lim.set_ceiling_db(-6.0);
        let g = lim.process_frame(1.0);
        assert!((1.0 * g) <= crate::math::db_to_linear(-6.0) + 1e-6);
    }
}
