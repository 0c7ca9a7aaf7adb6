//! Flashtape - Flashcard Study Recording Assembler
//!
//! Flashtape turns two folders of short clips (words and their definitions,
//! paired by index) into a single MP3 for listening practice.
//!
//! # Pipeline
//!
//! - Plan: shuffle the pairs once per round, avoiding a repeat at round boundaries
//! - Assemble: trim trailing silence, optionally level each clip, and append
//!   prompt, pause, response, pause for every planned entry
//! - Export: encode the finished recording to MP3

pub mod assembly;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use assembly::{Assembler, ClipCategory, ClipStore, PlaybackPlan, Session};
pub use config::AssemblyConfig;
pub use engine::AudioBuffer;
pub use error::{FlashtapeError, Result};
