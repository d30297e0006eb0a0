//! Lock-free meters readable from a control thread while the audio thread
//! writes them, without locks or allocation.
//!
//! `AtomicF32` is a thin bit-reinterpreting wrapper around `AtomicU32` —
//! there's no native atomic float, so every store/load round-trips through
//! `to_bits`/`from_bits`. All traffic here uses `Ordering::Relaxed`: meters
//! are read-mostly telemetry, not synchronization points, so total
//! ordering across fields doesn't matter.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// An `f32` stored behind an `AtomicU32` bit pattern.
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self {
            bits: AtomicU32::new(v.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: f32) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }
}

/// Audio-thread-writable, control-thread-readable level and stat meters.
#[derive(Debug)]
pub struct Meters {
    input_level_db: AtomicF32,
    output_level_db: AtomicF32,
    gain_reduction_db: AtomicF32,
    frames_processed: AtomicU64,
    underruns: AtomicU64,
}

impl Default for Meters {
    fn default() -> Self {
        Self::new()
    }
}

impl Meters {
    pub fn new() -> Self {
        Self {
            input_level_db: AtomicF32::new(crate::math::SILENCE_FLOOR_DB),
            output_level_db: AtomicF32::new(crate::math::SILENCE_FLOOR_DB),
            gain_reduction_db: AtomicF32::new(0.0),
            frames_processed: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn input_level_db(&self) -> f32 {
        self.input_level_db.load()
    }

    #[inline]
    pub fn set_input_level_db(&self, v: f32) {
        self.input_level_db.store(v);
    }

    #[inline]
    pub fn output_level_db(&self) -> f32 {
        self.output_level_db.load()
    }

    #[inline]
    pub fn set_output_level_db(&self, v: f32) {
        self.output_level_db.store(v);
    }

    #[inline]
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db.load()
    }

    #[inline]
    pub fn set_gain_reduction_db(&self, v: f32) {
        self.gain_reduction_db.store(v);
    }

    #[inline]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn add_frames_processed(&self, n: u64) {
        self.frames_processed.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero everything back to startup values.
    pub fn reset(&self) {
        self.input_level_db.store(crate::math::SILENCE_FLOOR_DB);
        self.output_level_db.store(crate::math::SILENCE_FLOOR_DB);
        self.gain_reduction_db.store(0.0);
        self.frames_processed.store(0, Ordering::Relaxed);
        self.underruns.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f32_round_trips() {
        let a = AtomicF32::new(-6.5);
        assert_eq!(a.load(), -6.5);
        a.store(3.25);
        assert_eq!(a.load(), 3.25);
    }

    #[test]
    fn meters_default_to_silence_floor() {
        let m = Meters::new();
        assert_eq!(m.input_level_db(), crate::math::SILENCE_FLOOR_DB);
        assert_eq!(m.gain_reduction_db(), 0.0);
    }

    #[test]
    fn frames_and_underruns_accumulate() {
        let m = Meters::new();
        m.add_frames_processed(512);
        m.add_frames_processed(512);
        assert_eq!(m.frames_processed(), 1024);

        m.record_underrun();
        assert_eq!(m.underruns(), 1);
    }

    #[test]
    fn reset_restores_startup_values() {
        let m = Meters::new();
        m.set_input_level_db(-3.0);
        m.add_frames_processed(1000);
        m.record_underrun();
        m.reset();
        assert_eq!(m.input_level_db(), crate::math::SILENCE_FLOOR_DB);
        assert_eq!(m.frames_processed(), 0);
        assert_eq!(m.underruns(), 0);
    }
}
