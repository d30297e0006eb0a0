//! Math Primitives
//!
//! The sole source of dB↔linear conversion and one-pole time-constant
//! derivation used throughout the engine. Every other module routes its
//! conversions through these functions so the conventions (the `-120 dB`
//! floor, the `1 - exp(...)` smoothing coefficient) stay consistent
//! end-to-end.
//!
//! # Design Notes
//! - No allocation, no panics: every function is total over `f32`.
//! - Safe for the audio thread.

/// Floor applied wherever a dB value would otherwise be `-inf` (silence,
/// a zero/negative argument to `log10`).
pub const SILENCE_FLOOR_DB: f32 = -120.0;

/// Convert a dB value to a linear amplitude multiplier.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Convert a linear amplitude to dB, flooring at [`SILENCE_FLOOR_DB`] for
/// non-positive input instead of returning `-inf`/`NaN`.
#[inline]
pub fn linear_to_db(x: f32) -> f32 {
    if x > 0.0 {
        20.0 * x.log10()
    } else {
        SILENCE_FLOOR_DB
    }
}

/// Clamp `v` into `[lo, hi]`.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.clamp(lo, hi)
}

/// Derive a one-pole smoothing coefficient from a time constant in
/// milliseconds and a sample rate. `time_ms <= 0` yields `1.0`
/// (instantaneous — the pole is fully open, no smoothing).
#[inline]
pub fn smooth_coef(time_ms: f32, sample_rate: f32) -> f32 {
    if time_ms > 0.0 {
        1.0 - (-1.0 / (time_ms * sample_rate / 1000.0)).exp()
    } else {
        1.0
    }
}
