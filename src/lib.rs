//! Real-time audio post-processing engine.
//!
//! A fixed-order signal chain - noise reduction, loudness normalization,
//! compression, equalization, peak limiting - built for hosts that need
//! allocation-free, lock-free processing on an audio callback thread, with
//! a separate control surface for parameter changes and metering.
//!
//! See [`processor::Processor`] for the entry point and [`ffi`] for the
//! C-ABI surface.

pub mod audio_block;
pub mod command;
pub mod config;
pub mod dsp;
pub mod error;
pub mod ffi;
pub mod math;
pub mod meters;
pub mod presets;
pub mod processor;

pub use audio_block::AudioBlock;
pub use config::{
    CompressionMode, EqPreset, NoiseReductionMode, ProcessorConfig, ProcessorState, ProcessorStatus,
};
pub use error::EngineError;
pub use processor::{Processor, ProcessorSnapshot, ProcessorStats};
