//! Audio Engine Module
//!
//! Core audio plumbing:
//! - Audio buffer type and level helpers
//! - Clip decoding
//! - MP3 export

pub mod buffer;
pub mod export;
pub mod io;

pub use buffer::AudioBuffer;
pub use export::{export, ExportFormat};
pub use io::{decode_file, load_wav, save_wav, CLIP_EXTENSIONS};
