//! Top-level engine: owns one instance of each DSP stage and runs them in
//! a fixed order on every block.
//!
//! # Threading Model
//! `process` runs on the audio thread and never allocates, locks, or does
//! I/O. Every control-surface method (`set_*`, `start_noise_learning`, …)
//! may be called from a different thread; scalar parameters go through
//! atomics read at the top of `process`, composite ones through the
//! [`crate::command`] queue drained at the same point.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::command::{command_channel, Command, CommandReceiver, CommandSender};
use crate::config::{CompressionMode, EqPreset, NoiseReductionMode, ProcessorConfig, ProcessorState, ProcessorStatus};
use crate::dsp::equalizer::BAND_COUNT;
use crate::dsp::{Compressor, Equalizer, Limiter, NoiseReducer, Normalizer};
use crate::math::linear_to_db;
use crate::meters::{AtomicF32, Meters};
use crate::presets::eq_preset_gains_db;
use crate::audio_block::AudioBlock;

const COMMAND_QUEUE_CAPACITY: usize = 16;

/// A processing run's aggregate counters, returned by `get_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorStats {
    pub frames_processed: u64,
    pub underruns: u64,
}

/// A serializable snapshot of everything needed to reproduce the current
/// processing configuration (but not transient envelope state).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ProcessorSnapshot {
    pub config: ProcessorConfig,
    pub bypass: bool,
    pub target_lufs: f32,
    pub compression_mode: CompressionMode,
    pub noise_reduction_mode: NoiseReductionMode,
    pub eq_preset: EqPreset,
    pub eq_bands: [f32; BAND_COUNT],
    pub voice_enhancement: bool,
}

/// Real-time audio post-processing engine: noise reduction, loudness
/// normalization, compression, equalization, and peak limiting, in that
/// fixed order.
pub struct Processor {
    config: ProcessorConfig,

    noise_reducer: NoiseReducer,
    normalizer: Normalizer,
    compressor: Compressor,
    equalizer: Equalizer,
    limiter: Limiter,

    meters: Meters,
    command_tx: Mutex<CommandSender>,
    command_rx: CommandReceiver,

    bypass: AtomicBool,
    enable_noise_reducer: AtomicBool,
    enable_normalizer: AtomicBool,
    enable_compressor: AtomicBool,
    enable_equalizer: AtomicBool,
    enable_limiter: AtomicBool,
    voice_enhancement: AtomicBool,

    target_lufs: AtomicF32,
    compression_mode: AtomicU8,
    noise_reduction_mode: AtomicU8,
    eq_preset: AtomicU8,
    eq_bands: [AtomicF32; BAND_COUNT],

    applied_target_lufs: f32,
    applied_compression_mode: CompressionMode,
    applied_noise_reduction_mode: NoiseReductionMode,
    applied_eq_bands: [f32; BAND_COUNT],
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        let sample_rate = config.sample_rate;
        let (command_tx, command_rx) = command_channel(COMMAND_QUEUE_CAPACITY);

        debug!(
            "Processor::new sample_rate={} channels={}",
            config.sample_rate, config.channels
        );

        Self {
            noise_reducer: NoiseReducer::new(sample_rate),
            normalizer: Normalizer::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            equalizer: Equalizer::new(sample_rate),
            limiter: Limiter::new(sample_rate),

            meters: Meters::new(),
            command_tx: Mutex::new(command_tx),
            command_rx,

            bypass: AtomicBool::new(false),
            enable_noise_reducer: AtomicBool::new(config.enable_noise_reducer),
            enable_normalizer: AtomicBool::new(config.enable_normalizer),
            enable_compressor: AtomicBool::new(config.enable_compressor),
            enable_equalizer: AtomicBool::new(config.enable_equalizer),
            enable_limiter: AtomicBool::new(config.enable_limiter),
            voice_enhancement: AtomicBool::new(false),

            target_lufs: AtomicF32::new(crate::dsp::normalizer::DEFAULT_TARGET_LUFS),
            compression_mode: AtomicU8::new(CompressionMode::default() as u8),
            noise_reduction_mode: AtomicU8::new(NoiseReductionMode::default() as u8),
            eq_preset: AtomicU8::new(EqPreset::default() as u8),
            eq_bands: std::array::from_fn(|_| AtomicF32::new(0.0)),

            applied_target_lufs: crate::dsp::normalizer::DEFAULT_TARGET_LUFS,
            applied_compression_mode: CompressionMode::default(),
            applied_noise_reduction_mode: NoiseReductionMode::default(),
            applied_eq_bands: [0.0; BAND_COUNT],

            config,
        }
    }

    // -- Control surface, callable from any thread -------------------------

    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    pub fn toggle_bypass(&self) {
        self.bypass.fetch_xor(true, Ordering::Relaxed);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    pub fn set_normalizer_target(&self, target_lufs: f32) {
        self.target_lufs.store(target_lufs);
    }

    pub fn set_compression_mode(&self, mode: CompressionMode) {
        self.compression_mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn set_noise_reduction_mode(&self, mode: NoiseReductionMode) {
        self.noise_reduction_mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn set_eq_preset(&self, preset: EqPreset) {
        debug!("set_eq_preset {}", preset.name());
        self.eq_preset.store(preset as u8, Ordering::Relaxed);
        let gains = eq_preset_gains_db(preset);
        for (i, g) in gains.iter().enumerate() {
            self.eq_bands[i].store(*g);
        }
        // Queued so the whole curve lands as one unit on the audio thread
        // instead of being picked up band-by-band across calls to
        // `drain_commands`.
        self.command_tx_send(Command::SetEqBands(gains));
    }

    pub fn set_eq_band(&self, index: usize, gain_db: f32) {
        if index < BAND_COUNT {
            self.eq_bands[index].store(gain_db);
        }
    }

    pub fn enable_voice_enhancement(&self, enabled: bool) {
        self.voice_enhancement.store(enabled, Ordering::Relaxed);
    }

    pub fn start_noise_learning(&self) {
        debug!("start_noise_learning");
        self.command_tx_send(Command::StartNoiseLearning);
    }

    pub fn stop_noise_learning(&self) {
        debug!("stop_noise_learning");
        self.command_tx_send(Command::StopNoiseLearning);
    }

    pub fn reset(&self) {
        debug!("reset");
        self.command_tx_send(Command::Reset);
    }

    /// The ring buffer producer takes `&mut self` to push, so control-side
    /// sends go through a `Mutex`. This lock is only ever taken from
    /// control threads — `process` never touches `command_tx`, only the
    /// lock-free `command_rx` side.
    fn command_tx_send(&self, cmd: Command) {
        if let Ok(mut tx) = self.command_tx.lock() {
            tx.send(cmd);
        }
    }

    pub fn get_levels(&self) -> (f32, f32, f32) {
        (
            self.meters.input_level_db(),
            self.meters.output_level_db(),
            self.meters.gain_reduction_db(),
        )
    }

    pub fn get_stats(&self) -> ProcessorStats {
        ProcessorStats {
            frames_processed: self.meters.frames_processed(),
            underruns: self.meters.underruns(),
        }
    }

    pub fn report_underrun(&self) {
        self.meters.record_underrun();
    }

    pub fn get_state(&self) -> ProcessorState {
        ProcessorState {
            state: if self.is_bypassed() {
                ProcessorStatus::Bypassed
            } else {
                ProcessorStatus::Active
            },
            bypass: self.is_bypassed(),
            input_level_db: self.meters.input_level_db(),
            output_level_db: self.meters.output_level_db(),
            gain_reduction_db: self.meters.gain_reduction_db(),
            frames_processed: self.meters.frames_processed(),
        }
    }

    pub fn snapshot(&self) -> ProcessorSnapshot {
        let mut eq_bands = [0.0f32; BAND_COUNT];
        for (i, b) in eq_bands.iter_mut().enumerate() {
            *b = self.eq_bands[i].load();
        }
        ProcessorSnapshot {
            config: self.config,
            bypass: self.is_bypassed(),
            target_lufs: self.target_lufs.load(),
            compression_mode: CompressionMode::from_u8(self.compression_mode.load(Ordering::Relaxed))
                .unwrap_or_default(),
            noise_reduction_mode: NoiseReductionMode::from_u8(self.noise_reduction_mode.load(Ordering::Relaxed))
                .unwrap_or_default(),
            eq_preset: EqPreset::from_u8(self.eq_preset.load(Ordering::Relaxed)).unwrap_or_default(),
            eq_bands,
            voice_enhancement: self.voice_enhancement.load(Ordering::Relaxed),
        }
    }

    // -- Audio thread --------------------------------------------------

    /// Process one block in place. A degenerate (empty) block is a no-op.
    pub fn process(&mut self, block: &mut AudioBlock) {
        if block.is_empty() {
            return;
        }

        self.drain_commands();
        self.sync_scalar_atomics();

        if self.bypass.load(Ordering::Relaxed) {
            return;
        }

        self.meters.set_input_level_db(linear_to_db(block.rms()));

        let frame_count = block.frame_count();
        let channels = block.channels();

        if self.config.enable_noise_reducer && self.enable_noise_reducer.load(Ordering::Relaxed) {
            self.noise_reducer
                .process_block(block.as_mut_slice(), frame_count, channels);
        }

        if self.config.enable_normalizer && self.enable_normalizer.load(Ordering::Relaxed) {
            if let Some(gain) = self.normalizer.process_block(block.as_slice(), frame_count, channels) {
                block.apply_gain(gain);
            }
        }

        let mut gain_reduction_db = 0.0f32;
        if self.config.enable_compressor && self.enable_compressor.load(Ordering::Relaxed) {
            for frame in 0..frame_count {
                let mut peak = 0.0f32;
                for ch in 0..channels {
                    peak = peak.max(block.get(frame, ch).abs());
                }
                let gain = self.compressor.process_frame(peak);
                for ch in 0..channels {
                    let x = block.get(frame, ch);
                    block.set(frame, ch, x * gain);
                }
            }
            gain_reduction_db = gain_reduction_db.max(self.compressor.gain_reduction_db());
        }

        if self.config.enable_equalizer && self.enable_equalizer.load(Ordering::Relaxed) {
            for frame in 0..frame_count {
                for ch in 0..channels {
                    let x = block.get(frame, ch);
                    let y = self.equalizer.process_sample(ch, x);
                    block.set(frame, ch, y);
                }
            }
        }

        if self.config.enable_limiter && self.enable_limiter.load(Ordering::Relaxed) {
            for frame in 0..frame_count {
                let mut peak = 0.0f32;
                for ch in 0..channels {
                    peak = peak.max(block.get(frame, ch).abs());
                }
                let gain = self.limiter.process_frame(peak);
                for ch in 0..channels {
                    let x = block.get(frame, ch);
                    block.set(frame, ch, x * gain);
                }
            }
            gain_reduction_db = gain_reduction_db.max(self.limiter.gain_reduction_db());
        }

        self.meters.set_gain_reduction_db(gain_reduction_db);
        self.meters.set_output_level_db(linear_to_db(block.rms()));
        self.meters.add_frames_processed(frame_count as u64);
    }

    fn drain_commands(&mut self) {
        let equalizer = &mut self.equalizer;
        let noise_reducer = &mut self.noise_reducer;
        let compressor = &mut self.compressor;
        let normalizer = &mut self.normalizer;
        let limiter = &mut self.limiter;
        let applied_eq_bands = &mut self.applied_eq_bands;

        self.command_rx.drain(|cmd| match cmd {
            Command::SetEqBands(gains) => {
                equalizer.set_bands(gains);
                *applied_eq_bands = gains;
            }
            Command::StartNoiseLearning => noise_reducer.start_learning(),
            Command::StopNoiseLearning => noise_reducer.stop_learning(),
            Command::Reset => {
                noise_reducer.reset();
                normalizer.reset();
                compressor.reset();
                equalizer.reset();
                limiter.reset();
            }
        });
    }

    /// Pull in scalar atomic changes that are cheap to apply directly on
    /// the audio thread (no allocation: table lookups and field writes).
    fn sync_scalar_atomics(&mut self) {
        let target_lufs = self.target_lufs.load();
        if target_lufs != self.applied_target_lufs {
            self.normalizer.set_target_lufs(target_lufs);
            self.applied_target_lufs = target_lufs;
        }

        if let Some(mode) = CompressionMode::from_u8(self.compression_mode.load(Ordering::Relaxed)) {
            if mode != self.applied_compression_mode {
                self.compressor.set_mode(mode);
                self.applied_compression_mode = mode;
            }
        }

        if let Some(mode) = NoiseReductionMode::from_u8(self.noise_reduction_mode.load(Ordering::Relaxed)) {
            if mode != self.applied_noise_reduction_mode {
                self.noise_reducer.set_mode(mode);
                self.applied_noise_reduction_mode = mode;
            }
        }

        self.noise_reducer
            .set_voice_enhancement(self.voice_enhancement.load(Ordering::Relaxed));

        for i in 0..BAND_COUNT {
            let v = self.eq_bands[i].load();
            if v != self.applied_eq_bands[i] {
                self.equalizer.set_band(i, v);
                self.applied_eq_bands[i] = v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_of(buf: &mut [f32], channels: usize, sample_rate: f32) -> AudioBlock<'_> {
        let frame_count = buf.len() / channels;
        AudioBlock::new(buf, frame_count, channels, sample_rate)
    }

    #[test]
    fn silence_in_produces_silence_out() {
        let mut proc = Processor::new(ProcessorConfig::default());
        let mut buf = vec![0.0f32; 1024];
        let mut block = block_of(&mut buf, 2, 48_000.0);
        proc.process(&mut block);
        assert!(block.peak() < 1e-6);
    }

    #[test]
    fn bypass_passes_audio_through_unchanged() {
        let mut proc = Processor::new(ProcessorConfig::default());
        proc.set_bypass(true);
        let original: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let mut buf = original.clone();
        let mut block = block_of(&mut buf, 2, 48_000.0);
        proc.process(&mut block);
        assert_eq!(block.to_vec(), original);
    }

    #[test]
    fn degenerate_block_is_a_noop() {
        let mut proc = Processor::new(ProcessorConfig::default());
        let mut buf: Vec<f32> = vec![];
        let mut block = AudioBlock::new(&mut buf, 0, 2, 48_000.0);
        proc.process(&mut block);
        assert_eq!(proc.get_stats().frames_processed, 0);
    }

    #[test]
    fn eq_preset_switch_updates_bands() {
        let proc = Processor::new(ProcessorConfig::default());
        proc.set_eq_preset(EqPreset::BassBoost);
        let snap = proc.snapshot();
        assert!(snap.eq_bands[0] > 0.0, "bass boost should raise the lowest band");
    }

    #[test]
    fn frames_processed_accumulates_across_blocks() {
        let mut proc = Processor::new(ProcessorConfig::default());
        let mut buf = vec![0.0f32; 512];
        for _ in 0..3 {
            let mut block = block_of(&mut buf, 2, 48_000.0);
            proc.process(&mut block);
        }
        assert_eq!(proc.get_stats().frames_processed, 3 * 256);
    }
}
