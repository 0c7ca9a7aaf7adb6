//! Clip Processing
//!
//! Per-clip DSP applied before a clip is appended to the recording:
//! trailing silence removal and loudness normalization.

mod compressor;
mod normalize;
mod trim;

pub use compressor::{CompressionSettings, Compressor};
pub use normalize::{peak_normalize, LoudnessNormalizer, DEFAULT_HEADROOM_DB};
pub use trim::{SilenceTrimmer, DEFAULT_SILENCE_THRESHOLD_DBFS, DEFAULT_WINDOW_MS};
