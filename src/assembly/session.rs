//! Session driver
//!
//! plan -> assemble -> export, stopping at the first failure. Nothing is
//! written unless every clip was assembled.

use std::path::{Path, PathBuf};

use crate::assembly::assembler::Assembler;
use crate::assembly::plan::PlaybackPlan;
use crate::assembly::store::ClipStore;
use crate::config::AssemblyConfig;
use crate::engine::{export, ExportFormat};
use crate::error::Result;

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub output: PathBuf,
    pub seed: u64,
    pub entries: usize,
    pub duration_secs: f64,
}

/// Runs a whole assembly against one store
pub struct Session<'a, S: ClipStore + ?Sized> {
    store: &'a S,
    config: AssemblyConfig,
    assembler: Assembler,
    format: ExportFormat,
}

impl<'a, S: ClipStore + ?Sized> Session<'a, S> {
    pub fn new(store: &'a S, config: AssemblyConfig) -> Self {
        let assembler = Assembler::new(&config);
        Self {
            store,
            config,
            assembler,
            format: ExportFormat::default(),
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Plan for this session's store and config
    pub fn plan(&self) -> Result<PlaybackPlan> {
        self.config.validate()?;
        PlaybackPlan::generate(
            self.store.len(),
            self.config.repeat_count as usize,
            self.config.random_seed,
        )
    }

    /// Plan, assemble and export to `output`
    pub fn run(&self, output: &Path) -> Result<SessionReport> {
        let plan = self.plan()?;
        log::info!(
            "Assembling {} pairs x {} rounds (seed {})",
            plan.clip_count(),
            plan.repeat_count(),
            plan.seed()
        );

        let recording = self.assembler.assemble(&plan, self.store)?;
        export(&recording, output, &self.format)?;

        Ok(SessionReport {
            output: output.to_path_buf(),
            seed: plan.seed(),
            entries: plan.len(),
            duration_secs: recording.duration_secs(),
        })
    }
}
