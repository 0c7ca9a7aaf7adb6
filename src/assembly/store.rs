//! Clip stores
//!
//! A store hands out decoded prompt/response clips by pair index. The
//! assembler only sees the [`ClipStore`] trait; where the clips came from
//! is the store's business.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::engine::{decode_file, AudioBuffer, CLIP_EXTENSIONS};
use crate::error::{FlashtapeError, Result};

/// Which half of a clip pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipCategory {
    /// The word being studied
    Prompt,
    /// Its definition
    Response,
}

impl fmt::Display for ClipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipCategory::Prompt => f.write_str("prompt"),
            ClipCategory::Response => f.write_str("response"),
        }
    }
}

/// Provider a clip pool was sourced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum ClipSource {
    /// Human pronunciations from Forvo
    Forvo,
    /// ElevenLabs text-to-speech
    #[value(name = "elevenlabs")]
    ElevenLabs,
    /// Google Cloud text-to-speech
    #[value(name = "google-tts")]
    GoogleTts,
    /// Audio pulled from an Anki deck
    Anki,
    /// Recorded or collected by hand
    #[default]
    Local,
}

impl fmt::Display for ClipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipSource::Forvo => "Forvo",
            ClipSource::ElevenLabs => "ElevenLabs",
            ClipSource::GoogleTts => "Google TTS",
            ClipSource::Anki => "Anki",
            ClipSource::Local => "local files",
        };
        f.write_str(name)
    }
}

/// Source of decoded clips, indexed `0..len()`
pub trait ClipStore {
    /// Number of clip pairs
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Card number shown to the user for `index`
    ///
    /// Stores that expose a sub-range of a larger deck map back to the
    /// deck position here; clip errors carry this number.
    fn card_index(&self, index: usize) -> usize {
        index
    }

    /// Decode one clip
    ///
    /// # Errors
    /// * `ClipNotFound` - If there is no clip for `index` in `category`
    /// * `ClipDecode` - If the clip exists but cannot be decoded
    /// * `ClipIo` - If the clip file cannot be read
    fn resolve(&self, index: usize, category: ClipCategory) -> Result<AudioBuffer>;
}

// ============================================================================
// Directory store
// ============================================================================

/// Clips stored as audio files in a prompt folder and a response folder
///
/// Files are matched by position after sorting by name, so `001.mp3` in the
/// word folder pairs with `001.mp3` (or `001_def.mp3`) in the definition folder.
#[derive(Debug, Clone)]
pub struct DirClipStore {
    prompts: Vec<PathBuf>,
    responses: Vec<PathBuf>,
    prompt_source: ClipSource,
    response_source: ClipSource,
    offset: usize,
    len: usize,
}

impl DirClipStore {
    /// Index the audio files in both folders
    ///
    /// # Errors
    /// * `DirectoryNotFound` - If either folder is missing
    pub fn open(prompt_dir: &Path, response_dir: &Path) -> Result<Self> {
        let prompts = list_clips(prompt_dir)?;
        let responses = list_clips(response_dir)?;
        let len = prompts.len().min(responses.len());
        if prompts.len() != responses.len() {
            log::warn!(
                "{} has {} clips but {} has {}; only the first {} pairs are used",
                prompt_dir.display(),
                prompts.len(),
                response_dir.display(),
                responses.len(),
                len
            );
        }

        log::debug!(
            "Indexed {} prompt clips in {} and {} response clips in {}",
            prompts.len(),
            prompt_dir.display(),
            responses.len(),
            response_dir.display()
        );

        Ok(Self {
            prompts,
            responses,
            prompt_source: ClipSource::default(),
            response_source: ClipSource::default(),
            offset: 0,
            len,
        })
    }

    /// Tag each pool with the provider it was sourced from
    pub fn with_sources(mut self, prompt_source: ClipSource, response_source: ClipSource) -> Self {
        self.prompt_source = prompt_source;
        self.response_source = response_source;
        self
    }

    /// Number of files found in each folder (prompt, response)
    pub fn file_counts(&self) -> (usize, usize) {
        (self.prompts.len(), self.responses.len())
    }

    pub fn source(&self, category: ClipCategory) -> ClipSource {
        match category {
            ClipCategory::Prompt => self.prompt_source,
            ClipCategory::Response => self.response_source,
        }
    }

    /// Narrow the store to file positions `range`; indices become relative to `range.start`
    ///
    /// # Errors
    /// * `InvalidArgument` - If the range is empty or runs past either folder
    pub fn select(mut self, range: Range<usize>) -> Result<Self> {
        if range.start >= range.end {
            return Err(FlashtapeError::invalid(
                "start_index",
                format!("start index {} must be < end index {}", range.start, range.end),
            ));
        }
        if range.end > self.prompts.len() {
            return Err(FlashtapeError::invalid(
                "end_index",
                format!(
                    "end index {} exceeds available word count {}",
                    range.end,
                    self.prompts.len()
                ),
            ));
        }
        if range.end > self.responses.len() {
            return Err(FlashtapeError::invalid(
                "end_index",
                format!(
                    "end index {} exceeds available definition count {}",
                    range.end,
                    self.responses.len()
                ),
            ));
        }
        self.offset = range.start;
        self.len = range.len();
        Ok(self)
    }

    /// Path of the file behind a clip
    pub fn path(&self, index: usize, category: ClipCategory) -> Option<&Path> {
        if index >= self.len {
            return None;
        }
        let files = match category {
            ClipCategory::Prompt => &self.prompts,
            ClipCategory::Response => &self.responses,
        };
        files.get(self.offset + index).map(PathBuf::as_path)
    }
}

impl ClipStore for DirClipStore {
    fn len(&self) -> usize {
        self.len
    }

    fn card_index(&self, index: usize) -> usize {
        self.offset + index
    }

    fn resolve(&self, index: usize, category: ClipCategory) -> Result<AudioBuffer> {
        let card = self.card_index(index);
        let path = self.path(index, category).ok_or(FlashtapeError::ClipNotFound {
            index: card,
            category,
        })?;

        log::debug!(
            "Decoding {} clip {} from {} ({})",
            category,
            card,
            path.display(),
            self.source(category)
        );

        decode_file(path).map_err(|e| tag_clip_error(e, card, category))
    }
}

/// Attach the card index and category to a decode failure
fn tag_clip_error(err: FlashtapeError, index: usize, category: ClipCategory) -> FlashtapeError {
    match err {
        FlashtapeError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            FlashtapeError::ClipNotFound { index, category }
        }
        FlashtapeError::Io(source) => FlashtapeError::ClipIo {
            index,
            category,
            source,
        },
        other => FlashtapeError::ClipDecode {
            index,
            category,
            reason: other.to_string(),
        },
    }
}

/// Sorted audio files directly inside `dir`
fn list_clips(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FlashtapeError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            FlashtapeError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
            }))
        })?;
        if entry.file_type().is_file() && is_clip_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_clip_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CLIP_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)))
}

// ============================================================================
// In-memory store
// ============================================================================

/// Clips held in memory; a `None` slot resolves to `ClipNotFound`
#[derive(Debug, Clone, Default)]
pub struct MemoryClipStore {
    pairs: Vec<(Option<AudioBuffer>, Option<AudioBuffer>)>,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a complete pair; returns its index
    pub fn push(&mut self, prompt: AudioBuffer, response: AudioBuffer) -> usize {
        self.push_partial(Some(prompt), Some(response))
    }

    /// Add a pair that may be missing either clip; returns its index
    pub fn push_partial(
        &mut self,
        prompt: Option<AudioBuffer>,
        response: Option<AudioBuffer>,
    ) -> usize {
        self.pairs.push((prompt, response));
        self.pairs.len() - 1
    }
}

impl ClipStore for MemoryClipStore {
    fn len(&self) -> usize {
        self.pairs.len()
    }

    fn resolve(&self, index: usize, category: ClipCategory) -> Result<AudioBuffer> {
        let pair = self.pairs.get(index);
        let clip = match category {
            ClipCategory::Prompt => pair.and_then(|(p, _)| p.as_ref()),
            ClipCategory::Response => pair.and_then(|(_, r)| r.as_ref()),
        };
        clip.cloned()
            .ok_or(FlashtapeError::ClipNotFound { index, category })
    }
}
