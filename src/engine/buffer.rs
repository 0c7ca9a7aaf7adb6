//! Audio Buffer
//!
//! The value type every stage of the pipeline passes around. Processing
//! functions take `&AudioBuffer` and return a new buffer.

use crate::error::{FlashtapeError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `f64::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// RMS level of a run of samples in dBFS
///
/// Returns `f64::NEG_INFINITY` for empty or all-zero input.
pub fn rms_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    linear_to_db((sum_sq / samples.len() as f64).sqrt())
}

/// Number of frames covering `ms` milliseconds at `sample_rate`, rounded to nearest
#[inline]
pub fn ms_to_frames(ms: u32, sample_rate: u32) -> usize {
    ((ms as u64 * sample_rate as u64 + 500) / 1000) as usize
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Interleaved audio buffer
///
/// Samples are stored as `[L0, R0, L1, R1, ...]`, normalized to -1.0..1.0.
/// A buffer may hold zero frames; trimming an all-silent clip produces one.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from existing interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(FlashtapeError::UnsupportedFormat {
                details: "zero-channel audio".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(FlashtapeError::UnsupportedFormat {
                details: "zero sample rate".to_string(),
            });
        }
        if samples.len() % channels as usize != 0 {
            return Err(FlashtapeError::UnsupportedFormat {
                details: format!(
                    "Sample count {} is not divisible by channel count {}",
                    samples.len(),
                    channels
                ),
            });
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a zero-length buffer with the given format
    pub fn empty(channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// Create a silent buffer lasting `duration_ms` milliseconds
    pub fn silence(duration_ms: u32, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let frames = ms_to_frames(duration_ms, sample_rate);
        Self {
            samples: vec![0.0; frames * channels as usize],
            channels,
            sample_rate,
        }
    }

    /// Create a mono sine wave test tone
    pub fn sine_wave(frequency: f32, amplitude: f32, duration_ms: u32, sample_rate: u32) -> Self {
        let frames = ms_to_frames(duration_ms, sample_rate);
        let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
        let samples = (0..frames)
            .map(|i| amplitude * (angular_freq * i as f32).sin())
            .collect();

        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Get a reference to the interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Get the sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Interleaved samples of frames `start..end`
    pub fn frame_slice(&self, start: usize, end: usize) -> &[f32] {
        let ch = self.channels as usize;
        let end = end.min(self.num_frames());
        let start = start.min(end);
        &self.samples[start * ch..end * ch]
    }

    /// Copy of the first `frames` frames
    pub fn truncated(&self, frames: usize) -> Self {
        Self {
            samples: self.frame_slice(0, frames).to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Absolute peak sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// RMS level of the whole buffer in dBFS
    pub fn dbfs(&self) -> f64 {
        rms_dbfs(&self.samples)
    }

    /// Copy of this buffer with every sample multiplied by `gain`
    pub fn with_gain(&self, gain: f32) -> Self {
        Self {
            samples: self.samples.iter().map(|&s| s * gain).collect(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Build a buffer from `samples` keeping this buffer's format
    pub(crate) fn with_samples(&self, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len() % self.channels as usize, 0);
        Self {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Whether `other` can be appended without conversion
    pub fn same_format(&self, other: &AudioBuffer) -> bool {
        self.channels == other.channels && self.sample_rate == other.sample_rate
    }

    /// Append another buffer of the same format
    pub fn append(&mut self, other: &AudioBuffer) -> Result<()> {
        if !self.same_format(other) {
            return Err(FlashtapeError::UnsupportedFormat {
                details: format!(
                    "cannot append {} ch @ {} Hz to {} ch @ {} Hz",
                    other.channels, other.sample_rate, self.channels, self.sample_rate
                ),
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Append `duration_ms` of silence in this buffer's format
    pub fn append_silence(&mut self, duration_ms: u32) {
        let frames = ms_to_frames(duration_ms, self.sample_rate);
        self.samples
            .resize(self.samples.len() + frames * self.channels as usize, 0.0);
    }

    /// Convert to the given channel count and sample rate
    ///
    /// Channels are up-mixed by repeating source channels and down-mixed by
    /// averaging. Resampling uses linear interpolation.
    pub fn conform(&self, channels: u16, sample_rate: u32) -> Self {
        let remixed = self.remix(channels.max(1));
        if remixed.sample_rate == sample_rate || remixed.is_empty() {
            return Self {
                sample_rate,
                ..remixed
            };
        }

        let ch = remixed.channels as usize;
        let planar: Vec<Vec<f32>> = (0..ch)
            .map(|c| remixed.samples.iter().skip(c).step_by(ch).copied().collect())
            .collect();
        let resampled = resample_channels(&planar, remixed.sample_rate, sample_rate);
        Self {
            samples: interleave(&resampled),
            channels: remixed.channels,
            sample_rate,
        }
    }

    fn remix(&self, channels: u16) -> Self {
        if channels == self.channels {
            return self.clone();
        }
        let src = self.channels as usize;
        let dst = channels as usize;
        let mut samples = Vec::with_capacity(self.num_frames() * dst);
        for frame in self.samples.chunks_exact(src) {
            if dst > src {
                samples.extend((0..dst).map(|c| frame[c % src]));
            } else {
                let mono = frame.iter().sum::<f32>() / src as f32;
                samples.extend(std::iter::repeat(mono).take(dst));
            }
        }
        Self {
            samples,
            channels,
            sample_rate: self.sample_rate,
        }
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.is_empty() {
        return Vec::new();
    }

    let frames = channels[0].len();
    let mut result = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }
    result
}

fn resample_channels(channels: &[Vec<f32>], source_rate: u32, target_rate: u32) -> Vec<Vec<f32>> {
    let ratio = target_rate as f64 / source_rate as f64;
    channels
        .iter()
        .map(|channel| resample_linear(channel, ratio))
        .collect()
}

/// Linear interpolation resampling
///
/// Good enough for speech clips; introduces some aliasing when downsampling.
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).round().max(1.0) as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            samples[source_len - 1]
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_silence_generation() {
        let buffer = AudioBuffer::silence(2000, 2, 48000);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.num_frames(), 96000);
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
        assert_eq!(buffer.dbfs(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_ms_to_frames_rounds() {
        assert_eq!(ms_to_frames(300, 44100), 13230);
        assert_eq!(ms_to_frames(10, 22050), 221);
        assert_eq!(ms_to_frames(0, 44100), 0);
    }

    #[test]
    fn test_rms_of_sine_wave() {
        let buffer = AudioBuffer::sine_wave(440.0, 1.0, 1000, 44100);
        // RMS of a unit sine wave is 1/sqrt(2) = -3.01 dB
        assert!((buffer.dbfs() - (-3.01)).abs() < 0.05);
    }

    #[test]
    fn test_new_rejects_ragged_samples() {
        let result = AudioBuffer::new(vec![0.0; 3], 2, 44100);
        assert!(matches!(
            result,
            Err(FlashtapeError::UnsupportedFormat { .. })
        ));
        assert!(AudioBuffer::new(Vec::new(), 2, 44100).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_silence() {
        let mut out = AudioBuffer::empty(1, 1000);
        let tone = AudioBuffer::sine_wave(100.0, 0.5, 20, 1000);
        out.append(&tone).unwrap();
        out.append_silence(30);
        assert_eq!(out.num_frames(), 50);
        assert!(out.samples()[20..].iter().all(|&s| s == 0.0));

        let stereo = AudioBuffer::silence(10, 2, 1000);
        assert!(out.append(&stereo).is_err());
    }

    #[test]
    fn test_truncated_keeps_format() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer = AudioBuffer::new(samples, 2, 8000).unwrap();
        let cut = buffer.truncated(2);
        assert_eq!(cut.samples(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(cut.channels(), 2);
        assert_eq!(buffer.truncated(10), buffer);
    }

    #[test]
    fn test_conform_mono_to_stereo() {
        let mono = AudioBuffer::new(vec![0.1, 0.2], 1, 8000).unwrap();
        let stereo = mono.conform(2, 8000);
        assert_eq!(stereo.samples(), &[0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_conform_stereo_to_mono_averages() {
        let stereo = AudioBuffer::new(vec![0.2, 0.4, -0.2, 0.0], 2, 8000).unwrap();
        let mono = stereo.conform(1, 8000);
        assert_relative_eq!(mono.samples()[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(mono.samples()[1], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_conform_resamples_duration() {
        let tone = AudioBuffer::sine_wave(440.0, 0.5, 500, 22050);
        let up = tone.conform(1, 44100);
        assert_eq!(up.sample_rate(), 44100);
        assert_eq!(up.num_frames(), tone.num_frames() * 2);
        assert_relative_eq!(up.duration_secs(), tone.duration_secs(), epsilon = 1e-3);
    }

    #[test]
    fn test_resample_linear_upsample() {
        let resampled = resample_linear(&[0.0, 1.0, 0.0], 2.0);
        assert_eq!(resampled.len(), 6);
        assert!((resampled[1] - 0.5).abs() < 0.01);
    }
}
