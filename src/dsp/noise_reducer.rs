//! Wide-band Noise Reducer
//!
//! An adaptive noise gate, not a spectral-subtraction or ML denoiser —
//! there is no FFT anywhere in this module. It tracks a single noise
//! floor in dB from each block's RMS and attenuates samples that sit
//! within `reduction_db` of that floor, sample by sample.
//!
//! # Design Notes
//! - The floor is measured once per block (from the whole interleaved
//!   block's RMS), then applied per sample — the gate itself has no
//!   per-sample envelope of its own.
//! - The optional voice-band shaping stage (highpass + presence peak) is a
//!   fixed cosmetic EQ, independent of the gate; it runs after gating so
//!   the gate always sees the true input level.
//! - Gain applied to a sample is always `<= 1.0`: the reducer can only
//!   attenuate, never add level.

use crate::config::NoiseReductionMode;
use crate::dsp::biquad::{Biquad, FilterKind};
use crate::math::{clamp, db_to_linear, linear_to_db, SILENCE_FLOOR_DB};

const LEARN_UPDATE_RATE: f32 = 0.1;
const ADAPT_RATE: f32 = 0.01;
const ADAPT_WINDOW_DB: f32 = 10.0;
const VOICE_HPF_HZ: f32 = 300.0;
const VOICE_PRESENCE_HZ: f32 = 2_500.0;
const VOICE_PRESENCE_GAIN_DB: f32 = 3.0;

/// Learned or fixed noise-floor estimate, shared across channels.
#[derive(Debug, Clone, Copy)]
pub struct NoiseProfile {
    pub floor_db: f32,
    pub is_learned: bool,
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            floor_db: SILENCE_FLOOR_DB,
            is_learned: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VoiceShaper {
    hpf: Biquad,
    presence: Biquad,
}

impl VoiceShaper {
    fn new(sample_rate: f32) -> Self {
        let mut hpf = Biquad::new();
        hpf.configure(FilterKind::Highpass, VOICE_HPF_HZ, sample_rate, 0.707, 0.0);
        let mut presence = Biquad::new();
        presence.configure(
            FilterKind::Peak,
            VOICE_PRESENCE_HZ,
            sample_rate,
            1.0,
            VOICE_PRESENCE_GAIN_DB,
        );
        Self { hpf, presence }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        self.presence.process(self.hpf.process(x))
    }

    fn reset(&mut self) {
        self.hpf.reset();
        self.presence.reset();
    }
}

/// Adaptive wide-band noise gate with an optional voice-presence shaping
/// stage, operating on up to two channels.
pub struct NoiseReducer {
    mode: NoiseReductionMode,
    reduction_db: f32,
    voice_enhance: bool,
    learning: bool,
    profile: NoiseProfile,
    shapers: [VoiceShaper; 2],
}

impl NoiseReducer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            mode: NoiseReductionMode::default(),
            reduction_db: NoiseReductionMode::default().default_reduction_db(),
            voice_enhance: false,
            learning: false,
            profile: NoiseProfile::default(),
            shapers: [VoiceShaper::new(sample_rate), VoiceShaper::new(sample_rate)],
        }
    }

    pub fn set_mode(&mut self, mode: NoiseReductionMode) {
        self.mode = mode;
        self.reduction_db = mode.default_reduction_db();
    }

    pub fn set_voice_enhancement(&mut self, enabled: bool) {
        self.voice_enhance = enabled;
    }

    pub fn start_learning(&mut self) {
        self.learning = true;
        self.profile.is_learned = false;
    }

    pub fn stop_learning(&mut self) {
        self.learning = false;
        self.profile.is_learned = true;
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    pub fn profile(&self) -> NoiseProfile {
        self.profile
    }

    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Gate one block of interleaved `frame_count * channels` samples in
    /// place: measure the block's floor/learning update once, then apply
    /// the resulting threshold sample by sample.
    pub fn process_block(&mut self, samples: &mut [f32], frame_count: usize, channels: usize) {
        if frame_count == 0 || channels == 0 {
            return;
        }

        let mut sum_sq = 0.0f64;
        for &s in samples.iter() {
            sum_sq += (s as f64) * (s as f64);
        }
        let mean_sq = sum_sq / (frame_count * channels) as f64;
        let rms_db = if mean_sq > 0.0 {
            linear_to_db(mean_sq.sqrt() as f32)
        } else {
            SILENCE_FLOOR_DB
        };

        if self.learning {
            if self.profile.is_learned {
                self.profile.floor_db += LEARN_UPDATE_RATE * (rms_db - self.profile.floor_db);
            } else {
                self.profile.floor_db = rms_db;
                self.profile.is_learned = true;
            }
        }

        if self.mode == NoiseReductionMode::Adaptive && rms_db <= self.profile.floor_db + ADAPT_WINDOW_DB {
            self.profile.floor_db += ADAPT_RATE * (rms_db - self.profile.floor_db);
            self.reduction_db = clamp(-(self.profile.floor_db + 40.0), 6.0, 24.0);
        }

        let threshold = self.profile.floor_db + self.reduction_db / 2.0;
        let reduction_db = self.reduction_db;

        for frame in 0..frame_count {
            for ch in 0..channels {
                let i = frame * channels + ch;
                let s = samples[i];
                let input_db = linear_to_db(s.abs());
                let mut y = if input_db < threshold {
                    let atten_db = (threshold - input_db).min(reduction_db);
                    s * db_to_linear(-atten_db)
                } else {
                    s
                };
                if self.voice_enhance {
                    y = self.shapers[ch.min(1)].process(y);
                }
                samples[i] = y;
            }
        }
    }

    pub fn reset(&mut self) {
        for shaper in &mut self.shapers {
            shaper.reset();
        }
        self.learning = false;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.shapers = [VoiceShaper::new(sample_rate), VoiceShaper::new(sample_rate)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(samples: &[f32], channels: usize) -> (Vec<f32>, usize) {
        let frame_count = samples.len() / channels;
        (samples.to_vec(), frame_count)
    }

    #[test]
    fn gate_never_amplifies_above_input() {
        let mut nr = NoiseReducer::new(48_000.0);
        nr.set_mode(NoiseReductionMode::Aggressive);
        let source: Vec<f32> = (0..2048).map(|n| (n as f32 * 0.1).sin()).collect();
        let (mut buf, frame_count) = block(&source, 2);
        nr.process_block(&mut buf, frame_count, 2);
        for (y, x) in buf.iter().zip(source.iter()) {
            assert!(y.abs() <= x.abs() + 1e-4, "gate should only attenuate");
        }
    }

    #[test]
    fn steady_low_level_noise_gets_attenuated_after_learning() {
        let mut nr = NoiseReducer::new(48_000.0);
        nr.set_mode(NoiseReductionMode::Aggressive);
        nr.start_learning();
        for _ in 0..40 {
            let mut buf = vec![0.01f32; 1024];
            nr.process_block(&mut buf, 512, 2);
        }
        nr.stop_learning();

        let mut buf = vec![0.01f32; 1024];
        nr.process_block(&mut buf, 512, 2);
        let mean: f32 = buf.iter().map(|s| s.abs()).sum::<f32>() / buf.len() as f32;
        assert!(mean < 0.01, "noise near the learned floor should be attenuated");
    }

    #[test]
    fn loud_signal_passes_through_near_unity() {
        let mut nr = NoiseReducer::new(48_000.0);
        nr.set_mode(NoiseReductionMode::Moderate);
        let source: Vec<f32> = (0..1024).map(|n| (n as f32 * 0.05).sin() * 0.9).collect();
        let (mut buf, frame_count) = block(&source, 2);
        nr.process_block(&mut buf, frame_count, 2);
        let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.5, "a loud signal well above the floor should pass through nearly unattenuated");
    }

    #[test]
    fn reset_clears_voice_shaper_state_without_panicking() {
        let mut nr = NoiseReducer::new(48_000.0);
        nr.set_voice_enhancement(true);
        let mut buf = vec![0.05f32; 512];
        nr.process_block(&mut buf, 256, 2);
        nr.reset();
        let mut buf2 = vec![0.0f32; 512];
        nr.process_block(&mut buf2, 256, 2);
        assert!(buf2.iter().all(|s| s.abs() < 1e-5));
    }

    #[test]
    fn empty_block_is_noop() {
        let mut nr = NoiseReducer::new(48_000.0);
        let mut buf: Vec<f32> = vec![];
        nr.process_block(&mut buf, 0, 2);
        assert!(buf.is_empty());
    }
}
