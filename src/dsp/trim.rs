//! Trailing silence removal
//!
//! Downloaded pronunciations and TTS output often end with a long tail of
//! near-silence. Left in place, the tail stretches every configured pause.

use serde::{Deserialize, Serialize};

use crate::engine::buffer::{rms_dbfs, ms_to_frames, AudioBuffer};

/// Default silence threshold in dBFS
pub const DEFAULT_SILENCE_THRESHOLD_DBFS: f64 = -50.0;

/// Default analysis window in milliseconds
pub const DEFAULT_WINDOW_MS: u32 = 10;

/// Removes trailing near-silence from a clip
///
/// The buffer is scanned backward in fixed windows. A window whose RMS level
/// is below `threshold_dbfs` (or has no energy at all) is silent; the end of
/// the clip moves back until the first non-silent window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceTrimmer {
    /// Level below which a window counts as silent, in dBFS
    pub threshold_dbfs: f64,
    /// Analysis window length in milliseconds
    pub window_ms: u32,
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self {
            threshold_dbfs: DEFAULT_SILENCE_THRESHOLD_DBFS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

impl SilenceTrimmer {
    pub fn new(threshold_dbfs: f64, window_ms: u32) -> Self {
        Self {
            threshold_dbfs,
            window_ms,
        }
    }

    /// Window length in frames at the given sample rate (at least one frame)
    pub fn window_frames(&self, sample_rate: u32) -> usize {
        ms_to_frames(self.window_ms, sample_rate).max(1)
    }

    /// Return a copy of `buffer` without its trailing silence
    ///
    /// An all-silent buffer trims to zero frames.
    pub fn trim(&self, buffer: &AudioBuffer) -> AudioBuffer {
        buffer.truncated(self.trimmed_len(buffer))
    }

    /// Number of frames kept by [`SilenceTrimmer::trim`]
    pub fn trimmed_len(&self, buffer: &AudioBuffer) -> usize {
        let window = self.window_frames(buffer.sample_rate());
        let mut end = buffer.num_frames();

        while end > 0 {
            let start = end.saturating_sub(window);
            if self.is_silent(buffer.frame_slice(start, end)) {
                end = start;
            } else {
                break;
            }
        }

        end
    }

    fn is_silent(&self, samples: &[f32]) -> bool {
        let level = rms_dbfs(samples);
        level == f64::NEG_INFINITY || level < self.threshold_dbfs
    }
}
