//! Loudness Normalizer
//!
//! Measures integrated loudness with a K-weighting cascade modeled on ITU-R
//! BS.1770 and applies a single smoothed makeup-gain scalar to bring the
//! signal toward a target LUFS.
//!
//! # Accumulation Quirk
//! `integrated_sum` accumulates `block_sum * frame_count` rather than
//! plain `block_sum`. This double-weights every block by its own frame
//! count and is not how BS.1770 integration is normally done — it is kept
//! intentionally rather than "corrected", since changing it would shift
//! every already-tuned default target and preset in the chain above it.
//!
//! # Design Notes
//! - K-weighting state is per channel, never shared.
//! - Gain is a single scalar applied equally to every channel — the
//!   normalizer never alters the stereo balance.
//! - Blocks below the `-70 dB` gate contribute zero to the loudness sum
//!   but still pass through the gain stage unchanged.

use crate::dsp::biquad::{Biquad, FilterKind};
use crate::math::{clamp, smooth_coef};

const K_HIGH_SHELF_HZ: f32 = 1_500.0;
const K_HIGH_SHELF_GAIN_DB: f32 = 4.0;
const K_HIGHPASS_HZ: f32 = 38.0;
const K_FILTER_Q: f32 = 0.5;
const ABSOLUTE_GATE_DB: f32 = -70.0;
const GAIN_SMOOTH_MS: f32 = 100.0;

pub const DEFAULT_TARGET_LUFS: f32 = -14.0;
pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 12.0;

#[derive(Debug, Clone, Copy)]
struct KWeighting {
    shelf: Biquad,
    hpf: Biquad,
}

impl KWeighting {
    fn new(sample_rate: f32) -> Self {
        let mut shelf = Biquad::new();
        shelf.configure(
            FilterKind::HighShelf,
            K_HIGH_SHELF_HZ,
            sample_rate,
            K_FILTER_Q,
            K_HIGH_SHELF_GAIN_DB,
        );
        let mut hpf = Biquad::new();
        hpf.configure(FilterKind::Highpass, K_HIGHPASS_HZ, sample_rate, K_FILTER_Q, 0.0);
        Self { shelf, hpf }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        self.hpf.process(self.shelf.process(x))
    }

    fn reset(&mut self) {
        self.shelf.reset();
        self.hpf.reset();
    }
}

/// Integrated-loudness tracker and makeup-gain smoother.
pub struct Normalizer {
    k_weighting: [KWeighting; 2],
    integrated_sum: f64,
    integrated_frames: u64,
    target_lufs: f32,
    current_gain: f32,
    gain_coef: f32,
    last_block_lufs: f32,
}

impl Normalizer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            k_weighting: [KWeighting::new(sample_rate), KWeighting::new(sample_rate)],
            integrated_sum: 0.0,
            integrated_frames: 0,
            target_lufs: DEFAULT_TARGET_LUFS,
            current_gain: 1.0,
            gain_coef: smooth_coef(GAIN_SMOOTH_MS, sample_rate),
            last_block_lufs: crate::math::SILENCE_FLOOR_DB,
        }
    }

    pub fn set_target_lufs(&mut self, target: f32) {
        self.target_lufs = target;
    }

    pub fn target_lufs(&self) -> f32 {
        self.target_lufs
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.k_weighting = [KWeighting::new(sample_rate), KWeighting::new(sample_rate)];
        self.gain_coef = smooth_coef(GAIN_SMOOTH_MS, sample_rate);
    }

    /// Measure this block's loudness contribution from an interleaved
    /// `frame_count * channels` sample slice (the same layout
    /// [`crate::audio_block::AudioBlock`] uses) and return the current
    /// smoothed linear makeup gain to apply, or `None` if the block fell
    /// below the absolute gate and must be left untouched — the caller
    /// must skip gain application entirely in that case, not just the
    /// loudness update.
    pub fn process_block(&mut self, samples: &[f32], frame_count: usize, channels: usize) -> Option<f32> {
        if frame_count == 0 || channels == 0 {
            return Some(self.current_gain);
        }

        let mut block_sum = 0.0f64;
        for frame in 0..frame_count {
            for ch in 0..channels {
                let i = frame * channels + ch;
                let kw = &mut self.k_weighting[ch.min(1)];
                let w = kw.process(samples[i]);
                block_sum += (w as f64) * (w as f64);
            }
        }

        let mean_sq_block = block_sum / (frame_count * channels) as f64;
        let block_lufs = if mean_sq_block > 0.0 {
            (-0.691 + 10.0 * mean_sq_block.log10()) as f32
        } else {
            crate::math::SILENCE_FLOOR_DB
        };
        self.last_block_lufs = block_lufs;

        if block_lufs < ABSOLUTE_GATE_DB {
            // Below the gate: skip both the loudness update and gain
            // application, returning the block untouched.
            return None;
        }

        // Deliberately preserved: double-weights by frame_count rather
        // than accumulating block_sum directly.
        self.integrated_sum += block_sum * frame_count as f64;
        self.integrated_frames += frame_count as u64;

        let integrated_lufs = self.integrated_lufs();
        let error_db = self.target_lufs - integrated_lufs;
        let target_gain_db = clamp(error_db, MIN_GAIN_DB, MAX_GAIN_DB);
        let target_gain = crate::math::db_to_linear(target_gain_db);

        self.current_gain += self.gain_coef * (target_gain - self.current_gain);
        Some(self.current_gain)
    }

    /// Current integrated loudness estimate in LUFS. Carries the
    /// `block_sum * frame_count` accumulation quirk described at the top
    /// of this module, so it runs hotter than a standard BS.1770 reading.
    pub fn integrated_lufs(&self) -> f32 {
        if self.integrated_frames == 0 {
            return crate::math::SILENCE_FLOOR_DB;
        }
        let mean_sq = self.integrated_sum / (self.integrated_frames * 2) as f64;
        if mean_sq > 0.0 {
            (-0.691 + 10.0 * mean_sq.log10()) as f32
        } else {
            crate::math::SILENCE_FLOOR_DB
        }
    }

    pub fn last_block_lufs(&self) -> f32 {
        self.last_block_lufs
    }

    pub fn reset(&mut self) {
        for kw in &mut self.k_weighting {
            kw.reset();
        }
        self.integrated_sum = 0.0;
        self.integrated_frames = 0;
        self.current_gain = 1.0;
        self.last_block_lufs = crate::math::SILENCE_FLOOR_DB;
    }
}
