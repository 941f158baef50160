//! Subtitle errors.

use thiserror::Error;

/// Errors from the text recognition step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognitionError {
    /// The recognizer ran but reported a failure.
    #[error("recognition failed: {0}")]
    Failed(String),

    /// The recognizer succeeded but produced no cues.
    #[error("no text recognized")]
    NoText,
}

/// Errors from reading or writing subtitle files.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("invalid SRT timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
