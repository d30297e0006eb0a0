//! Dynamic Range Compressor
//!
//! Feed-forward compression with a static soft-knee curve, per-frame
//! cross-channel peak detection, and automatic makeup gain pulled from the
//! active preset rather than computed adaptively.
//!
//! # Lifecycle
//! - **Active**: gain reduction follows the envelope toward the curve.
//! - **Bypassed**: passed through unchanged; caller is responsible for not
//!   calling `process` at all when bypassed (see `Processor`).
//!
//! # Gain Reduction Metering
//! `gain_reduction_db` is always `>= 0`: it reports how much the signal
//! was turned down, never up. Switching presets resets nothing — only
//! `reset()` zeros the envelope.

use crate::config::{CompressionMode, CompressorParams};
use crate::dsp::envelope::EnvelopeFollower;
use crate::math::{db_to_linear, linear_to_db};

/// Soft-knee feed-forward gain reduction curve, in dB. `x_db` is the
/// input level above silence; the return value is the (negative or zero)
/// reduction to apply.
fn soft_knee_reduction_db(x_db: f32, threshold_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let half_knee = knee_db * 0.5;
    if x_db < threshold_db - half_knee {
        return 0.0;
    }
    if x_db > threshold_db + half_knee {
        let over = x_db - threshold_db;
        return over / ratio - over;
    }
    // Inside the knee: quadratic blend from 0 reduction to the hard-knee
    // slope, per the RBJ-style soft-knee formulation.
    let delta = x_db - threshold_db + half_knee;
    let knee_ratio = delta / knee_db.max(1e-6);
    let over = delta * knee_ratio * 0.5;
    over / ratio - over
}

/// Feed-forward dynamics compressor with a soft-knee curve and automatic
/// makeup gain.
pub struct Compressor {
    sample_rate: f32,
    envelope: EnvelopeFollower,
    params: CompressorParams,
    gain_reduction_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32) -> Self {
        let params = CompressionMode::default().params();
        Self {
            sample_rate,
            envelope: EnvelopeFollower::new(params.attack_ms, params.release_ms, sample_rate),
            params,
            gain_reduction_db: 0.0,
        }
    }

    pub fn set_mode(&mut self, mode: CompressionMode) {
        self.params = mode.params();
        self.envelope
            .set_times(self.params.attack_ms, self.params.release_ms, self.sample_rate);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.envelope
            .set_times(self.params.attack_ms, self.params.release_ms, sample_rate);
    }

    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Compute the linear gain to apply to every channel for one frame,
    /// given the cross-channel peak magnitude of that frame.
    #[inline]
    pub fn process_frame(&mut self, cross_channel_peak: f32) -> f32 {
        let input_db = linear_to_db(cross_channel_peak);
        let target_reduction_db =
            soft_knee_reduction_db(input_db, self.params.threshold_db, self.params.ratio, self.params.knee_db);

        // The envelope tracks the magnitude of the reduction so attack
        // governs how fast gain comes down and release how fast it
        // recovers toward zero reduction.
        let tracked = self.envelope.process(-target_reduction_db);
        self.gain_reduction_db = tracked.max(0.0);

        db_to_linear(-self.gain_reduction_db + self.params.makeup_db)
    }

    pub fn reset(&mut self) {
        self.envelope.reset();
        self.gain_reduction_db = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_below_threshold_is_not_reduced() {
        let mut comp = Compressor::new(48_000.0);
        comp.set_mode(CompressionMode::Moderate);
        let mut gain = 1.0;
        for _ in 0..10_000 {
            gain = comp.process_frame(db_to_linear(-40.0));
        }
        assert!(comp.gain_reduction_db() < 0.5, "quiet signal shouldn't be gain-reduced");
        assert!(gain > 0.0);
    }

    #[test]
    fn signal_above_threshold_is_reduced() {
        let mut comp = Compressor::new(48_000.0);
        comp.set_mode(CompressionMode::Aggressive);
        for _ in 0..10_000 {
            comp.process_frame(db_to_linear(0.0));
        }
        assert!(comp.gain_reduction_db() > 1.0, "loud signal should be reduced: {}", comp.gain_reduction_db());
    }

    #[test]
    fn gain_reduction_metering_is_never_negative() {
        let mut comp = Compressor::new(48_000.0);
        comp.set_mode(CompressionMode::Limiting);
        for n in 0..5_000 {
            let level = if n % 2 == 0 { 0.01 } else { 0.9 };
            comp.process_frame(level);
            assert!(comp.gain_reduction_db() >= 0.0);
        }
    }

    #[test]
    fn reset_zeros_gain_reduction() {
        let mut comp = Compressor::new(48_000.0);
        comp.set_mode(CompressionMode::Aggressive);
        for _ in 0..2000 {
            comp.process_frame(1.0);
        }
        assert!(comp.gain_reduction_db() > 0.0);
        comp.reset();
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }

    #[test]
    fn gentle_mode_reduces_less_than_aggressive_for_same_input() {
        let mut gentle = Compressor::new(48_000.0);
        gentle.set_mode(CompressionMode::Gentle);
        let mut aggressive = Compressor::new(48_000.0);
        aggressive.set_mode(CompressionMode::Aggressive);

        for _ in 0..10_000 {
            gentle.process_frame(db_to_linear(-6.0));
            aggressive.process_frame(db_to_linear(-6.0));
        }
        assert!(gentle.gain_reduction_db() < aggressive.gain_reduction_db());
    }
}
