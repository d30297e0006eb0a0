//! Factory preset tables: ISO band centers and the gain curve for each
//! [`EqPreset`](crate::config::EqPreset).
//!
//! Every curve is a fixed, named set of per-band gains; a host that wants
//! a different shape is free to ship its own by calling
//! `Processor::set_eq_band` ten times after selecting `EqPreset::Flat`.

use once_cell::sync::Lazy;

use crate::config::EqPreset;

/// ISO-standard one-third-octave-adjacent band centers used by the
/// equalizer, low to high.
pub const ISO_BAND_CENTERS_HZ: [f32; 10] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1_000.0, 2_000.0, 4_000.0, 8_000.0, 16_000.0,
];

/// The eight factory curves, indexed by `EqPreset as usize`. Built once,
/// lazily, rather than re-matched on every preset switch.
static EQ_PRESET_TABLE: Lazy<[[f32; 10]; 8]> = Lazy::new(|| {
    [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],           // Flat
        [-6.0, -4.0, -2.0, 0.0, 2.0, 4.0, 4.0, 2.0, 0.0, -2.0],       // Speech
        [2.0, 1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 2.0, 2.0, 1.0],          // Music
        [6.0, 5.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],           // BassBoost
        [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 4.0, 5.0, 6.0],           // TrebleBoost
        [6.0, 4.0, 1.0, 0.0, -1.0, 0.0, 1.0, 3.0, 4.0, 3.0],          // Loudness
        [0.0, 0.0, 0.0, 0.0, 1.0, 3.0, 5.0, 7.0, 9.0, 10.0],          // HearingAid
        [-8.0, -6.0, -3.0, -1.0, 0.0, 2.0, 2.0, 1.0, 0.0, -1.0],      // NightMode
    ]
});

/// Per-band gain in dB for a factory preset, aligned with
/// [`ISO_BAND_CENTERS_HZ`].
pub fn eq_preset_gains_db(preset: EqPreset) -> [f32; 10] {
    EQ_PRESET_TABLE[preset as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_preset_is_all_zero() {
        assert_eq!(eq_preset_gains_db(EqPreset::Flat), [0.0; 10]);
    }

    #[test]
    fn band_centers_are_ascending() {
        for w in ISO_BAND_CENTERS_HZ.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn every_preset_has_ten_bands_within_clamp_range() {
        for preset in [
            EqPreset::Flat,
            EqPreset::Speech,
            EqPreset::Music,
            EqPreset::BassBoost,
            EqPreset::TrebleBoost,
            EqPreset::Loudness,
            EqPreset::HearingAid,
            EqPreset::NightMode,
        ] {
            let gains = eq_preset_gains_db(preset);
            assert_eq!(gains.len(), 10);
            for g in gains {
                assert!((-24.0..=24.0).contains(&g));
            }
        }
    }
}
