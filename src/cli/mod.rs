//! CLI Module
//!
//! Command-line interface for the Flashtape assembler.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::assembly::ClipSource;

/// Flashtape - build shuffled flashcard study recordings
#[derive(Parser, Debug)]
#[command(name = "flashtape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble word/definition clips into one MP3
    #[command(name = "assemble")]
    Assemble(AssembleArgs),

    /// Print a playback plan as JSON without touching any audio
    #[command(name = "plan")]
    Plan {
        /// Number of clip pairs
        #[arg(long)]
        count: usize,

        /// How many times to shuffle and repeat the pairs
        #[arg(long, default_value_t = 1)]
        repeat_count: usize,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AssembleArgs {
    /// Starting index for the word/definition range
    #[arg(long)]
    pub start_index: usize,

    /// Ending index for the word/definition range (exclusive)
    #[arg(long)]
    pub end_index: usize,

    /// How many times to shuffle and repeat the flashcards
    #[arg(long)]
    pub repeat_count: Option<u32>,

    /// Directory containing word audio files
    #[arg(long, default_value = "words")]
    pub word_folder: PathBuf,

    /// Directory containing definition audio files
    #[arg(long, default_value = "definitions")]
    pub definition_folder: PathBuf,

    /// Directory to store results
    #[arg(long, default_value = "output")]
    pub output_folder: PathBuf,

    /// Milliseconds of silence after a word, before its definition [default: 3000]
    #[arg(long)]
    pub pause_after_word: Option<u32>,

    /// Milliseconds of silence after a definition, before the next word [default: 1000]
    #[arg(long)]
    pub pause_after_definition: Option<u32>,

    /// Normalize and compress all clips to the same volume
    #[arg(long)]
    pub normalize: bool,

    /// Shuffle seed, for reproducible recordings
    #[arg(long)]
    pub seed: Option<u64>,

    /// MP3 bitrate in kbps
    #[arg(long, default_value_t = 128)]
    pub bitrate: u32,

    /// Provider the word clips came from
    #[arg(long, value_enum, default_value_t = ClipSource::Local)]
    pub word_source: ClipSource,

    /// Provider the definition clips came from
    #[arg(long, value_enum, default_value_t = ClipSource::Local)]
    pub definition_source: ClipSource,

    /// JSON file with assembly settings; command-line values take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}
