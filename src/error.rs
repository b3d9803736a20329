//! Error handling for WOD cast decoding.
//!
//! Distinguishes the expected end-of-stream condition from records that
//! cannot be decoded, unsupported format versions and fatal resource
//! failures in the growable store.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::Axis;

#[derive(Error, Debug)]
pub enum WodError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No more bytes in the source. Terminal, not a failure.
    #[error("End of stream reached")]
    EndOfStream,

    #[error("Malformed record at byte {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    #[error("Unsupported WOD format version tag '{tag}'")]
    UnsupportedFormatVersion { tag: char },

    #[error("Failed to grow {axis} buffers to {requested} entries")]
    Allocation { axis: Axis, requested: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },
}

impl WodError {
    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WodError>;
