//! Recording assembly
//!
//! Walks a playback plan in order and builds the study recording:
//! prompt, pause, response, pause for every entry.

use crate::assembly::plan::PlaybackPlan;
use crate::assembly::store::{ClipCategory, ClipStore};
use crate::config::AssemblyConfig;
use crate::dsp::{LoudnessNormalizer, SilenceTrimmer};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Builds the output buffer from a plan and a clip store
#[derive(Debug, Clone)]
pub struct Assembler {
    trimmer: SilenceTrimmer,
    normalizer: Option<LoudnessNormalizer>,
    pause_after_word_ms: u32,
    pause_after_definition_ms: u32,
}

impl Assembler {
    /// Assembler with the default trimmer and normalizer settings
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            trimmer: SilenceTrimmer::default(),
            normalizer: config.normalize.then(LoudnessNormalizer::default),
            pause_after_word_ms: config.pause_after_word_ms,
            pause_after_definition_ms: config.pause_after_definition_ms,
        }
    }

    pub fn with_trimmer(mut self, trimmer: SilenceTrimmer) -> Self {
        self.trimmer = trimmer;
        self
    }

    /// Replace the normalizer; has no effect unless normalization is enabled
    pub fn with_normalizer(mut self, normalizer: LoudnessNormalizer) -> Self {
        if self.normalizer.is_some() {
            self.normalizer = Some(normalizer);
        }
        self
    }

    /// Assemble the recording
    ///
    /// Stops at the first clip that cannot be resolved or decoded; the
    /// partially built buffer is dropped.
    ///
    /// # Errors
    /// * `ClipNotFound` / `ClipDecode` - Tagged with the failing index and category
    pub fn assemble<S: ClipStore + ?Sized>(
        &self,
        plan: &PlaybackPlan,
        store: &S,
    ) -> Result<AudioBuffer> {
        let mut output: Option<AudioBuffer> = None;

        for (position, &index) in plan.order().iter().enumerate() {
            if position % plan.clip_count() == 0 {
                log::info!(
                    "Repeat {} of {}",
                    position / plan.clip_count() + 1,
                    plan.repeat_count()
                );
            }

            let prompt = self.prepare(store, index, ClipCategory::Prompt)?;
            let response = self.prepare(store, index, ClipCategory::Response)?;

            let out = output.get_or_insert_with(|| {
                AudioBuffer::empty(prompt.channels(), prompt.sample_rate())
            });
            append_conformed(out, &prompt)?;
            out.append_silence(self.pause_after_word_ms);
            append_conformed(out, &response)?;
            out.append_silence(self.pause_after_definition_ms);

            log::debug!(
                "Added word and definition for index {}",
                store.card_index(index)
            );
        }

        // Plans are never empty, so the first entry always sets the format
        Ok(output.unwrap_or_else(|| AudioBuffer::empty(1, 44100)))
    }

    /// Resolve, trim and (optionally) normalize one clip
    fn prepare<S: ClipStore + ?Sized>(
        &self,
        store: &S,
        index: usize,
        category: ClipCategory,
    ) -> Result<AudioBuffer> {
        let clip = store.resolve(index, category)?;
        let trimmed = self.trimmer.trim(&clip);
        Ok(match &self.normalizer {
            Some(normalizer) => normalizer.normalize(&trimmed),
            None => trimmed,
        })
    }
}

/// Append `clip`, converting it to `out`'s format first if needed
fn append_conformed(out: &mut AudioBuffer, clip: &AudioBuffer) -> Result<()> {
    if out.same_format(clip) {
        return out.append(clip);
    }
    log::warn!(
        "Converting clip from {} ch @ {} Hz to {} ch @ {} Hz",
        clip.channels(),
        clip.sample_rate(),
        out.channels(),
        out.sample_rate()
    );
    out.append(&clip.conform(out.channels(), out.sample_rate()))
}
