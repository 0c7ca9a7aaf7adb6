//! Loudness normalization
//!
//! Clips from different voices and providers differ widely in level.
//! Each clip goes through peak normalize -> compress -> peak normalize.

use serde::{Deserialize, Serialize};

use crate::dsp::compressor::{CompressionSettings, Compressor};
use crate::engine::buffer::{db_to_linear, AudioBuffer};

/// Default headroom left below full scale by peak normalization
pub const DEFAULT_HEADROOM_DB: f64 = 0.1;

/// Scale `buffer` so its absolute peak sits `headroom_db` below full scale
///
/// Silent buffers are returned unchanged.
pub fn peak_normalize(buffer: &AudioBuffer, headroom_db: f64) -> AudioBuffer {
    let peak = buffer.peak();
    if peak == 0.0 {
        return buffer.clone();
    }
    let target = db_to_linear(-headroom_db) as f32;
    buffer.with_gain(target / peak)
}

/// Evens out perceived loudness across clips
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessNormalizer {
    pub compression: CompressionSettings,
    pub headroom_db: f64,
}

impl Default for LoudnessNormalizer {
    fn default() -> Self {
        Self {
            compression: CompressionSettings::default(),
            headroom_db: DEFAULT_HEADROOM_DB,
        }
    }
}

impl LoudnessNormalizer {
    pub fn new(compression: CompressionSettings) -> Self {
        Self {
            compression,
            ..Self::default()
        }
    }

    pub fn normalize(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let compressor = Compressor::new(self.compression);
        let leveled = peak_normalize(buffer, self.headroom_db);
        let compressed = compressor.process(&leveled);
        peak_normalize(&compressed, self.headroom_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RATE: u32 = 44100;

    #[test]
    fn test_peak_normalize_hits_target() {
        let quiet = AudioBuffer::sine_wave(440.0, 0.1, 200, RATE);
        let loud = peak_normalize(&quiet, DEFAULT_HEADROOM_DB);
        assert_relative_eq!(loud.peak(), db_to_linear(-0.1) as f32, epsilon = 1e-4);
    }

    #[test]
    fn test_peak_normalize_leaves_silence_alone() {
        let silence = AudioBuffer::silence(100, 1, RATE);
        assert_eq!(peak_normalize(&silence, DEFAULT_HEADROOM_DB), silence);
    }

    #[test]
    fn test_normalized_clips_never_clip() {
        let normalizer = LoudnessNormalizer::default();
        for amplitude in [0.01, 0.3, 1.0] {
            let clip = AudioBuffer::sine_wave(330.0, amplitude, 400, RATE);
            let out = normalizer.normalize(&clip);
            assert!(out.peak() <= 1.0);
            assert_relative_eq!(out.peak(), db_to_linear(-0.1) as f32, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_normalize_evens_out_levels() {
        let normalizer = LoudnessNormalizer::default();
        let whisper = AudioBuffer::sine_wave(220.0, 0.02, 500, RATE);
        let shout = AudioBuffer::sine_wave(220.0, 0.9, 500, RATE);

        let before = (whisper.dbfs() - shout.dbfs()).abs();
        let after = (normalizer.normalize(&whisper).dbfs() - normalizer.normalize(&shout).dbfs()).abs();
        assert!(before > 30.0);
        assert!(after < 1.0, "level difference after normalization: {:.2} dB", after);
    }

    #[test]
    fn test_normalize_preserves_length_and_format() {
        let normalizer = LoudnessNormalizer::default();
        let clip = AudioBuffer::sine_wave(440.0, 0.5, 250, 22050).conform(2, 22050);
        let out = normalizer.normalize(&clip);
        assert_eq!(out.num_frames(), clip.num_frames());
        assert_eq!(out.channels(), 2);
        assert_eq!(out.sample_rate(), 22050);
    }
}
