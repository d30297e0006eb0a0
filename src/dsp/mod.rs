//! DSP processing stages, in the fixed order they run in
//! [`crate::processor::Processor::process`]:
//!
//! 1. [`noise_reducer`] — adaptive wide-band noise gate
//! 2. [`normalizer`] — K-weighted loudness measurement and makeup gain
//! 3. [`compressor`] — soft-knee dynamic range compression
//! 4. [`equalizer`] — 10-band parametric EQ
//! 5. [`limiter`] — brick-wall peak safety stage
//!
//! [`biquad`] and [`envelope`] are the shared primitives the stages above
//! are built from.

pub mod biquad;
pub mod compressor;
pub mod envelope;
pub mod equalizer;
pub mod limiter;
pub mod noise_reducer;
pub mod normalizer;

pub use biquad::{Biquad, FilterKind};
pub use compressor::Compressor;
pub use envelope::EnvelopeFollower;
pub use equalizer::Equalizer;
pub use limiter::Limiter;
pub use noise_reducer::{NoiseProfile, NoiseReducer};
pub use normalizer::Normalizer;
