//! Subtitle cues and converted tracks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One timed line of subtitle text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Cue {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A text subtitle file produced from a bitmap track, muxed as an extra
/// input of the encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSubtitle {
    /// Stream index of the bitmap track it replaces.
    pub source_index: u32,
    pub path: PathBuf,
    /// Three-letter language code written to the output.
    pub language: String,
    pub cue_count: usize,
}
