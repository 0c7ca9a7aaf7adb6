//! Flashtape CLI - Flashcard Study Recording Assembler
//!
//! Command-line interface for the Flashtape assembler.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use flashtape::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Flashtape v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Assemble(args) => {
            commands::assemble(&args).map_err(|e| {
                let context = match e.failing_clip() {
                    Some((index, category)) => {
                        format!("Error processing index {} ({})", index, category)
                    }
                    None => format!("Assembly failed [{}]", e.error_code()),
                };
                log::error!("{}", e.recovery_hint());
                anyhow::Error::new(e).context(context)
            })?;
        }
        Commands::Plan {
            count,
            repeat_count,
            seed,
        } => {
            commands::plan(count, repeat_count, seed).context("Could not build a plan")?;
        }
    }

    Ok(())
}
