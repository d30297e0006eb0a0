//! Processor configuration, status, and the mode/preset enums that the
//! control surface switches between.
//!
//! # Design Notes
//! - `ProcessorConfig` is immutable after construction; the
//!   `enable_*` flags live here as the *default* at startup but are
//!   re-exposed as live atomics on [`crate::processor::Processor`] so they
//!   can still be toggled at runtime without reaching back into this
//!   struct.
//! - Everything here derives `Serialize`/`Deserialize` so a host can
//!   persist/restore it; the crate does not implement persistence itself
//!   (out of scope).

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
pub const DEFAULT_CHANNELS: usize = 2;
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;
pub const MAX_SAMPLE_RATE: f32 = 192_000.0;
pub const MAX_CHANNELS: usize = 2;

/// Immutable-after-construction engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub sample_rate: f32,
    pub channels: usize,
    pub enable_noise_reducer: bool,
    pub enable_normalizer: bool,
    pub enable_compressor: bool,
    pub enable_equalizer: bool,
    pub enable_limiter: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            enable_noise_reducer: true,
            enable_normalizer: true,
            enable_compressor: true,
            enable_equalizer: true,
            enable_limiter: true,
        }
    }
}

impl ProcessorConfig {
    /// Build a config, clamping out-of-range fields into a safe range
    /// instead of failing — the engine never rejects a config.
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        Self {
            sample_rate: sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE),
            channels: channels.clamp(1, MAX_CHANNELS),
            ..Self::default()
        }
    }
}

/// Lifecycle state of the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorStatus {
    Idle,
    Active,
    Bypassed,
    Error,
}

/// Snapshot of processor status and meters, as returned by
/// `processor_get_state` / `Processor::get_state`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessorState {
    pub state: ProcessorStatus,
    pub bypass: bool,
    pub input_level_db: f32,
    pub output_level_db: f32,
    pub gain_reduction_db: f32,
    pub frames_processed: u64,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self {
            state: ProcessorStatus::Idle,
            bypass: false,
            input_level_db: crate::math::SILENCE_FLOOR_DB,
            output_level_db: crate::math::SILENCE_FLOOR_DB,
            gain_reduction_db: 0.0,
            frames_processed: 0,
        }
    }
}

/// Noise reducer operating mode. `Adaptive` tracks the floor
/// continuously; the fixed modes use a static `reduction_db`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NoiseReductionMode {
    Light = 0,
    Moderate = 1,
    Aggressive = 2,
    Adaptive = 3,
}

impl NoiseReductionMode {
    /// Default `reduction_db` for each mode.
    pub fn default_reduction_db(self) -> f32 {
        match self {
            NoiseReductionMode::Light => 6.0,
            NoiseReductionMode::Moderate => 12.0,
            NoiseReductionMode::Aggressive => 20.0,
            NoiseReductionMode::Adaptive => 10.0,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(NoiseReductionMode::Light),
            1 => Some(NoiseReductionMode::Moderate),
            2 => Some(NoiseReductionMode::Aggressive),
            3 => Some(NoiseReductionMode::Adaptive),
            _ => None,
        }
    }
}

impl Default for NoiseReductionMode {
    fn default() -> Self {
        NoiseReductionMode::Adaptive
    }
}

/// Compressor preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionMode {
    Gentle = 0,
    Moderate = 1,
    Aggressive = 2,
    Limiting = 3,
}

/// Static curve parameters for one [`CompressionMode`].
#[derive(Debug, Clone, Copy)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub knee_db: f32,
    pub makeup_db: f32,
}

impl CompressionMode {
    pub fn params(self) -> CompressorParams {
        match self {
            CompressionMode::Gentle => CompressorParams {
                threshold_db: -20.0,
                ratio: 2.0,
                attack_ms: 20.0,
                release_ms: 200.0,
                knee_db: 6.0,
                makeup_db: 2.0,
            },
            CompressionMode::Moderate => CompressorParams {
                threshold_db: -18.0,
                ratio: 4.0,
                attack_ms: 10.0,
                release_ms: 150.0,
                knee_db: 4.0,
                makeup_db: 4.0,
            },
            CompressionMode::Aggressive => CompressorParams {
                threshold_db: -15.0,
                ratio: 8.0,
                attack_ms: 5.0,
                release_ms: 100.0,
                knee_db: 2.0,
                makeup_db: 6.0,
            },
            CompressionMode::Limiting => CompressorParams {
                threshold_db: -1.0,
                ratio: 20.0,
                attack_ms: 0.5,
                release_ms: 50.0,
                knee_db: 0.0,
                makeup_db: 0.0,
            },
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionMode::Gentle),
            1 => Some(CompressionMode::Moderate),
            2 => Some(CompressionMode::Aggressive),
            3 => Some(CompressionMode::Limiting),
            _ => None,
        }
    }
}

impl Default for CompressionMode {
    fn default() -> Self {
        CompressionMode::Moderate
    }
}

/// Named factory curves for the 10-band equalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EqPreset {
    Flat = 0,
    Speech = 1,
    Music = 2,
    BassBoost = 3,
    TrebleBoost = 4,
    Loudness = 5,
    HearingAid = 6,
    NightMode = 7,
}

impl Default for EqPreset {
    fn default() -> Self {
        EqPreset::Flat
    }
}

impl EqPreset {
    pub fn name(self) -> &'static str {
        match self {
            EqPreset::Flat => "flat",
            EqPreset::Speech => "speech",
            EqPreset::Music => "music",
            EqPreset::BassBoost => "bass_boost",
            EqPreset::TrebleBoost => "treble_boost",
            EqPreset::Loudness => "loudness",
            EqPreset::HearingAid => "hearing_aid",
            EqPreset::NightMode => "night_mode",
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(EqPreset::Flat),
            1 => Some(EqPreset::Speech),
            2 => Some(EqPreset::Music),
            3 => Some(EqPreset::BassBoost),
            4 => Some(EqPreset::TrebleBoost),
            5 => Some(EqPreset::Loudness),
            6 => Some(EqPreset::HearingAid),
            7 => Some(EqPreset::NightMode),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clamps_sample_rate_and_channels() {
        let cfg = ProcessorConfig::new(1.0, 9);
        assert_eq!(cfg.sample_rate, MIN_SAMPLE_RATE);
        assert_eq!(cfg.channels, MAX_CHANNELS);
    }

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = ProcessorConfig::default();
        assert_eq!(cfg.sample_rate, 48_000.0);
        assert_eq!(cfg.channels, 2);
        assert!(cfg.enable_noise_reducer);
        assert!(cfg.enable_limiter);
    }

    #[test]
    fn compression_mode_round_trips_through_u8() {
        for m in [
            CompressionMode::Gentle,
            CompressionMode::Moderate,
            CompressionMode::Aggressive,
            CompressionMode::Limiting,
        ] {
            assert_eq!(CompressionMode::from_u8(m as u8), Some(m));
        }
        assert_eq!(CompressionMode::from_u8(99), None);
    }
}
