//! Assembly configuration
//!
//! Values the assembly core consumes. They come from the command line, an
//! optional JSON file, or both (command-line values win).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlashtapeError, Result};

/// Default pause after a prompt clip, in milliseconds
pub const DEFAULT_PAUSE_AFTER_WORD_MS: u32 = 3000;

/// Default pause after a response clip, in milliseconds
pub const DEFAULT_PAUSE_AFTER_DEFINITION_MS: u32 = 1000;

/// Pacing and shuffling options for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    /// Silence between a prompt and its response
    pub pause_after_word_ms: u32,
    /// Silence after a response, before the next prompt
    pub pause_after_definition_ms: u32,
    /// Number of shuffled rounds over all pairs
    pub repeat_count: u32,
    /// Run each clip through the loudness normalizer
    pub normalize: bool,
    /// Seed for the shuffle; a random one is drawn when absent
    pub random_seed: Option<u64>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            pause_after_word_ms: DEFAULT_PAUSE_AFTER_WORD_MS,
            pause_after_definition_ms: DEFAULT_PAUSE_AFTER_DEFINITION_MS,
            repeat_count: 1,
            normalize: false,
            random_seed: None,
        }
    }
}

impl AssemblyConfig {
    /// Load and validate a config from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AssemblyConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeat_count < 1 {
            return Err(FlashtapeError::invalid(
                "repeat_count",
                format!("must be at least 1, got {}", self.repeat_count),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = AssemblyConfig::default();
        assert_eq!(config.pause_after_word_ms, 3000);
        assert_eq!(config.pause_after_definition_ms, 1000);
        assert_eq!(config.repeat_count, 1);
        assert!(!config.normalize);
        assert!(config.random_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "repeat_count": 4, "random_seed": 42 }"#).unwrap();

        let config = AssemblyConfig::from_json_file(&path).unwrap();
        assert_eq!(config.repeat_count, 4);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.pause_after_word_ms, DEFAULT_PAUSE_AFTER_WORD_MS);
    }

    #[test]
    fn test_zero_repeat_count_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "repeat_count": 0 }"#).unwrap();

        let err = AssemblyConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, FlashtapeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_negative_pause_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "pause_after_word_ms": -5 }"#).unwrap();

        let err = AssemblyConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, FlashtapeError::Config(_)));
    }
}
