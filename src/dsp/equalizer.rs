//! 10-Band Parametric Equalizer
//!
//! A fixed bank of peaking biquads at ISO-adjacent band centers, one
//! filter chain per channel. Every band shares the same `Q`; only gain is
//! adjustable per band. When every band gain and the output trim are
//! exactly zero the filter chain is skipped entirely rather than run at
//! unity.

use crate::dsp::biquad::{Biquad, FilterKind};
use crate::math::{clamp, db_to_linear};
use crate::presets::ISO_BAND_CENTERS_HZ;

const BAND_Q: f32 = std::f32::consts::SQRT_2;
pub const BAND_COUNT: usize = 10;
pub const MIN_BAND_GAIN_DB: f32 = -24.0;
pub const MAX_BAND_GAIN_DB: f32 = 24.0;

struct ChannelBands {
    filters: [Biquad; BAND_COUNT],
}

impl ChannelBands {
    fn new(sample_rate: f32, gains_db: &[f32; BAND_COUNT]) -> Self {
        let mut filters = [Biquad::new(); BAND_COUNT];
        for (i, f) in filters.iter_mut().enumerate() {
            f.configure(FilterKind::Peak, ISO_BAND_CENTERS_HZ[i], sample_rate, BAND_Q, gains_db[i]);
        }
        Self { filters }
    }

    fn retune(&mut self, sample_rate: f32, gains_db: &[f32; BAND_COUNT]) {
        for (i, f) in self.filters.iter_mut().enumerate() {
            f.configure(FilterKind::Peak, ISO_BAND_CENTERS_HZ[i], sample_rate, BAND_Q, gains_db[i]);
        }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let mut y = x;
        for f in self.filters.iter_mut() {
            y = f.process(y);
        }
        y
    }

    fn reset(&mut self) {
        for f in self.filters.iter_mut() {
            f.reset();
        }
    }
}

pub struct Equalizer {
    sample_rate: f32,
    channels: [ChannelBands; 2],
    gains_db: [f32; BAND_COUNT],
    output_gain_db: f32,
}

impl Equalizer {
    pub fn new(sample_rate: f32) -> Self {
        let gains_db = [0.0; BAND_COUNT];
        Self {
            sample_rate,
            channels: [
                ChannelBands::new(sample_rate, &gains_db),
                ChannelBands::new(sample_rate, &gains_db),
            ],
            gains_db,
            output_gain_db: 0.0,
        }
    }

    pub fn set_bands(&mut self, gains_db: [f32; BAND_COUNT]) {
        let clamped = gains_db.map(|g| clamp(g, MIN_BAND_GAIN_DB, MAX_BAND_GAIN_DB));
        self.gains_db = clamped;
        for ch in &mut self.channels {
            ch.retune(self.sample_rate, &self.gains_db);
        }
    }

    pub fn set_band(&mut self, index: usize, gain_db: f32) {
        if index >= BAND_COUNT {
            return;
        }
        self.gains_db[index] = clamp(gain_db, MIN_BAND_GAIN_DB, MAX_BAND_GAIN_DB);
        for ch in &mut self.channels {
            ch.filters[index].configure(
                FilterKind::Peak,
                ISO_BAND_CENTERS_HZ[index],
                self.sample_rate,
                BAND_Q,
                self.gains_db[index],
            );
        }
    }

    pub fn set_output_gain_db(&mut self, gain_db: f32) {
        self.output_gain_db = clamp(gain_db, MIN_BAND_GAIN_DB, MAX_BAND_GAIN_DB);
    }

    pub fn bands(&self) -> [f32; BAND_COUNT] {
        self.gains_db
    }

    fn is_flat(&self) -> bool {
        self.output_gain_db == 0.0 && self.gains_db.iter().all(|&g| g == 0.0)
    }

    #[inline]
    pub fn process_sample(&mut self, ch: usize, x: f32) -> f32 {
        if self.is_flat() {
            return x;
        }
        let y = self.channels[ch.min(1)].process(x);
        y * db_to_linear(self.output_gain_db)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for ch in &mut self.channels {
            ch.retune(sample_rate, &self.gains_db);
        }
    }

    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_eq_passes_signal_unchanged() {
        let mut eq = Equalizer::new(48_000.0);
        for x in [0.0, 0.3, -0.7, 1.0] {
            assert_eq!(eq.process_sample(0, x), x);
        }
    }

    #[test]
    fn nonzero_band_gain_disables_the_flat_shortcut() {
        let mut eq = Equalizer::new(48_000.0);
        eq.set_band(0, 6.0);
        // A DC-ish low frequency pushed through a boosted low band should no
        // longer be bit-identical to the input.
        let mut last_in = 0.0;
        let mut last_out = 0.0;
        for n in 0..2000 {
            let x = (n as f32 * 0.002).sin();
            last_in = x;
            last_out = eq.process_sample(0, x);
        }
        assert_ne!(last_in, last_out);
    }

    #[test]
    fn band_gain_is_clamped() {
        let mut eq = Equalizer::new(48_000.0);
        eq.set_band(3, 999.0);
        assert_eq!(eq.bands()[3], MAX_BAND_GAIN_DB);
        eq.set_band(3, -999.0);
        assert_eq!(eq.bands()[3], MIN_BAND_GAIN_DB);
    }

    #[test]
    fn set_bands_replaces_whole_curve() {
        let mut eq = Equalizer::new(48_000.0);
        let curve = [1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, -2.0, -1.0];
        eq.set_bands(curve);
        assert_eq!(eq.bands(), curve);
    }

    #[test]
    fn out_of_range_band_index_is_noop() {
        let mut eq = Equalizer::new(48_000.0);
        eq.set_band(42, 6.0);
        assert_eq!(eq.bands(), [0.0; BAND_COUNT]);
    }
}
