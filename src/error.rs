//! Error handling for Flashtape
//!
//! Every failure aborts the assembly run. Errors carry enough context
//! (index, category, path) to tell the user which clip broke the run.

use std::fmt;

use thiserror::Error;

use crate::assembly::ClipCategory;

/// Result type alias for Flashtape operations
pub type Result<T> = std::result::Result<T, FlashtapeError>;

/// Coarse failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    DecodeError,
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::DecodeError => "decode error",
            ErrorKind::IoError => "I/O error",
        };
        f.write_str(name)
    }
}

/// Main error type for Flashtape operations
#[derive(Error, Debug)]
pub enum FlashtapeError {
    // Argument Errors
    #[error("Invalid argument {param}: {reason}")]
    InvalidArgument { param: String, reason: String },

    // Lookup Errors
    #[error("No {category} clip for index {index}")]
    ClipNotFound { index: usize, category: ClipCategory },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // Decode Errors
    #[error("Failed to decode {category} clip for index {index}: {reason}")]
    ClipDecode {
        index: usize,
        category: ClipCategory,
        reason: String,
    },

    #[error("Failed to read {category} clip for index {index}")]
    ClipIo {
        index: usize,
        category: ClipCategory,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Unsupported audio format: {details}")]
    UnsupportedFormat { details: String },

    // Export Errors
    #[error("Failed to encode audio: {reason}")]
    Encode { reason: String },

    #[error("Failed to write {path}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl FlashtapeError {
    /// Shorthand for an [`FlashtapeError::InvalidArgument`]
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        FlashtapeError::InvalidArgument {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Coarse category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlashtapeError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            FlashtapeError::Config(_) => ErrorKind::InvalidArgument,
            FlashtapeError::ClipNotFound { .. } => ErrorKind::NotFound,
            FlashtapeError::DirectoryNotFound { .. } => ErrorKind::NotFound,
            FlashtapeError::ClipDecode { .. } => ErrorKind::DecodeError,
            FlashtapeError::Decode { .. } => ErrorKind::DecodeError,
            FlashtapeError::UnsupportedFormat { .. } => ErrorKind::DecodeError,
            FlashtapeError::ClipIo { .. } => ErrorKind::IoError,
            FlashtapeError::Encode { .. } => ErrorKind::IoError,
            FlashtapeError::Export { .. } => ErrorKind::IoError,
            FlashtapeError::Io(_) => ErrorKind::IoError,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FlashtapeError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            FlashtapeError::ClipNotFound { .. } => "CLIP_NOT_FOUND",
            FlashtapeError::DirectoryNotFound { .. } => "DIRECTORY_NOT_FOUND",
            FlashtapeError::ClipDecode { .. } => "CLIP_DECODE_ERROR",
            FlashtapeError::ClipIo { .. } => "CLIP_IO_ERROR",
            FlashtapeError::Decode { .. } => "DECODE_ERROR",
            FlashtapeError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            FlashtapeError::Encode { .. } => "ENCODE_ERROR",
            FlashtapeError::Export { .. } => "EXPORT_ERROR",
            FlashtapeError::Io(_) => "IO_ERROR",
            FlashtapeError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// The pair index and category of the clip that failed, if any
    pub fn failing_clip(&self) -> Option<(usize, ClipCategory)> {
        match self {
            FlashtapeError::ClipNotFound { index, category }
            | FlashtapeError::ClipDecode {
                index, category, ..
            }
            | FlashtapeError::ClipIo {
                index, category, ..
            } => Some((*index, *category)),
            _ => None,
        }
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "Check the command-line arguments and config file",
            Self::ClipNotFound {
                category: ClipCategory::Prompt,
                ..
            } => "Make sure every definition has a matching word clip",
            Self::ClipNotFound {
                category: ClipCategory::Response,
                ..
            } => "Make sure every word has a matching definition clip",
            Self::ClipIo { .. } => "Check that the clip file is readable",
            Self::DirectoryNotFound { .. } => "Check the word and definition folder paths",
            Self::ClipDecode { .. } | Self::Decode { .. } => {
                "The clip may be corrupted - try downloading it again"
            }
            Self::UnsupportedFormat { .. } => "Convert the clip to MP3 or WAV",
            Self::Export { .. } | Self::Io(_) => {
                "Check that the output folder exists and is writable"
            }
            Self::Config(_) => "Fix the JSON syntax or field types in the config file",
            _ => "Check the error details and try again",
        }
    }
}
