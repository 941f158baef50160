//! Subtitle conversion.
//!
//! Bitmap subtitle tracks are extracted from the input, passed to a
//! [`TextRecognizer`] and written back out as SRT so they can be muxed as
//! text. Text tracks never come through here.

mod converter;
mod error;
mod recognizer;
mod srt;
mod types;

pub use converter::{ConversionReport, SubtitleConverter, TrackSkip};
pub use error::{RecognitionError, SubtitleError};
pub use recognizer::{CommandRecognizer, Recognition, RecognitionRequest, TextRecognizer};
pub use srt::{format_timestamp, parse_srt, parse_timestamp, write_srt};
pub use types::{Cue, GeneratedSubtitle};
