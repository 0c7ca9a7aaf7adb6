//! Compressor
//!
//! A feed-forward dynamics processor used to even out clips recorded by
//! different voices and providers. Detection is RMS over a look-back window
//! as long as the attack time; gain reduction ramps in over the attack time
//! and back out over the release time.

use serde::{Deserialize, Serialize};

use crate::engine::buffer::{db_to_linear, linear_to_db, ms_to_frames, AudioBuffer};

/// Compressor settings
///
/// The defaults are the values every clip is compressed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Threshold level in dBFS
    pub threshold_db: f64,
    /// Compression ratio (3.0 = 3:1)
    pub ratio: f64,
    /// Attack time in milliseconds
    pub attack_ms: u32,
    /// Release time in milliseconds
    pub release_ms: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 3.0,
            attack_ms: 10,
            release_ms: 75,
        }
    }
}

/// Stateless dynamic range compressor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Compressor {
    settings: CompressionSettings,
}

impl Compressor {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CompressionSettings {
        &self.settings
    }

    /// Gain reduction target in dB (positive) for a given RMS level
    fn max_attenuation_db(&self, rms: f64, threshold_rms: f64) -> f64 {
        if rms <= 0.0 {
            return 0.0;
        }
        let db_over = linear_to_db(rms / threshold_rms).max(0.0);
        (1.0 - 1.0 / self.settings.ratio) * db_over
    }

    /// Return a compressed copy of `buffer`
    pub fn process(&self, buffer: &AudioBuffer) -> AudioBuffer {
        let channels = buffer.channels() as usize;
        let frames = buffer.num_frames();
        let samples = buffer.samples();
        if frames == 0 || self.settings.ratio <= 1.0 {
            return buffer.clone();
        }

        let rate = buffer.sample_rate();
        let look_frames = ms_to_frames(self.settings.attack_ms, rate).max(1);
        let attack_frames = look_frames as f64;
        let release_frames = ms_to_frames(self.settings.release_ms, rate).max(1) as f64;
        let threshold_rms = db_to_linear(self.settings.threshold_db);

        let frame_energy = |i: usize| -> f64 {
            samples[i * channels..(i + 1) * channels]
                .iter()
                .map(|&s| (s as f64) * (s as f64))
                .sum()
        };

        let mut output = Vec::with_capacity(samples.len());
        let mut window_energy = 0.0_f64;
        let mut attenuation = 0.0_f64;

        for i in 0..frames {
            // Look-back window is frames [i - look_frames, i)
            if i > 0 {
                window_energy += frame_energy(i - 1);
                if i > look_frames {
                    window_energy -= frame_energy(i - 1 - look_frames);
                }
                window_energy = window_energy.max(0.0);
            }
            let window_len = i.min(look_frames);
            let rms = if window_len == 0 {
                0.0
            } else {
                (window_energy / (window_len * channels) as f64).sqrt()
            };

            let max_attenuation = self.max_attenuation_db(rms, threshold_rms);
            if rms > threshold_rms && attenuation <= max_attenuation {
                attenuation = (attenuation + max_attenuation / attack_frames).min(max_attenuation);
            } else {
                attenuation = (attenuation - max_attenuation / release_frames).max(0.0);
            }

            let gain = db_to_linear(-attenuation) as f32;
            output.extend(samples[i * channels..(i + 1) * channels].iter().map(|&s| s * gain));
        }

        buffer.with_samples(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44100;

    #[test]
    fn test_default_settings() {
        let settings = CompressionSettings::default();
        assert_eq!(settings.threshold_db, -20.0);
        assert_eq!(settings.ratio, 3.0);
        assert_eq!(settings.attack_ms, 10);
        assert_eq!(settings.release_ms, 75);
    }

    #[test]
    fn test_below_threshold_passes_through() {
        let comp = Compressor::default();
        // -32 dBFS peak, well under the -20 dBFS threshold
        let quiet = AudioBuffer::sine_wave(440.0, 0.025, 500, RATE);
        assert_eq!(comp.process(&quiet), quiet);
    }

    #[test]
    fn test_loud_signal_is_reduced() {
        let comp = Compressor::default();
        let loud = AudioBuffer::sine_wave(440.0, 1.0, 1000, RATE);
        let out = comp.process(&loud);

        assert_eq!(out.num_frames(), loud.num_frames());
        // Input RMS is -3 dBFS: 17 dB over threshold, 3:1 takes ~11.3 dB off
        let settled = out.frame_slice(RATE as usize / 2, RATE as usize);
        let settled_rms = crate::engine::buffer::rms_dbfs(settled);
        assert!(
            (settled_rms - (-14.3)).abs() < 1.5,
            "settled RMS was {:.1} dBFS",
            settled_rms
        );
    }

    #[test]
    fn test_unity_ratio_is_identity() {
        let comp = Compressor::new(CompressionSettings {
            ratio: 1.0,
            ..CompressionSettings::default()
        });
        let loud = AudioBuffer::sine_wave(440.0, 1.0, 200, RATE);
        assert_eq!(comp.process(&loud), loud);
    }

    #[test]
    fn test_stereo_frames_share_gain() {
        let comp = Compressor::default();
        let mono = AudioBuffer::sine_wave(440.0, 0.9, 300, RATE);
        let stereo = mono.conform(2, RATE);
        let out = comp.process(&stereo);
        for frame in out.samples().chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }
}
