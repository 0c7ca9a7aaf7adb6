//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::info;

use crate::assembly::{ClipStore, DirClipStore, PlaybackPlan, Session, SessionReport};
use crate::cli::AssembleArgs;
use crate::config::AssemblyConfig;
use crate::engine::ExportFormat;
use crate::error::Result;

/// Output file name for a range of cards
pub fn output_file_name(start_index: usize, end_index: usize) -> String {
    format!("cards_{}-{}.mp3", start_index, end_index)
}

/// Merge the optional config file with command-line overrides
pub fn resolve_config(args: &AssembleArgs) -> Result<AssemblyConfig> {
    let mut config = match &args.config {
        Some(path) => AssemblyConfig::from_json_file(path)?,
        None => AssemblyConfig::default(),
    };

    if let Some(repeat_count) = args.repeat_count {
        config.repeat_count = repeat_count;
    }
    if let Some(pause) = args.pause_after_word {
        config.pause_after_word_ms = pause;
    }
    if let Some(pause) = args.pause_after_definition {
        config.pause_after_definition_ms = pause;
    }
    if args.normalize {
        config.normalize = true;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

/// Assemble the selected range of cards into one MP3.
pub fn assemble(args: &AssembleArgs) -> Result<SessionReport> {
    let config = resolve_config(args)?;

    let store = DirClipStore::open(&args.word_folder, &args.definition_folder)?
        .with_sources(args.word_source, args.definition_source)
        .select(args.start_index..args.end_index)?;
    info!(
        "Using cards {}..{} ({} pairs)",
        args.start_index,
        args.end_index,
        store.len()
    );

    let output = prepare_output(&args.output_folder, args.start_index, args.end_index)?;

    let report = Session::new(&store, config)
        .with_format(ExportFormat::new(args.bitrate))
        .run(&output)?;

    println!("Combined audio file created: {}", report.output.display());
    println!(
        "{} entries, {:.1}s, seed {}",
        report.entries, report.duration_secs, report.seed
    );

    Ok(report)
}

/// Print a playback plan as JSON.
pub fn plan(count: usize, repeat_count: usize, seed: Option<u64>) -> Result<()> {
    let plan = PlaybackPlan::generate(count, repeat_count, seed)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Ensure the output folder exists and return the output file path
fn prepare_output(folder: &Path, start_index: usize, end_index: usize) -> Result<PathBuf> {
    if !folder.exists() {
        info!("Creating output folder {}", folder.display());
        std::fs::create_dir_all(folder)?;
    }
    Ok(folder.join(output_file_name(start_index, end_index)))
}
