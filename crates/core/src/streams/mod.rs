//! Stream classification.
//!
//! Chooses which video, audio and subtitle streams of an input are carried
//! into the output, sorts subtitles into text and bitmap families and
//! normalizes their language tags.

mod classifier;
mod compat;
mod language;
mod types;

pub use classifier::{classify, ClassifyError};
pub use compat::{is_hevc, is_rewrap_compatible};
pub use language::{language_or_undetermined, normalize_language_tag, to_two_letter, UNDETERMINED};
pub use types::{ConversionOutcome, SkipReason, StreamSelection, SubtitleKind, SubtitleTrack};
