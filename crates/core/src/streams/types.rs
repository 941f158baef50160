//! Stream selection types.

use serde::{Deserialize, Serialize};

use crate::converter::StreamDescriptor;

/// Codec family of a subtitle stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleKind {
    /// Cue text with timing, embeddable as-is.
    Text,
    /// Rendered images per cue, needs recognition.
    Bitmap,
}

const TEXT_CODECS: &[&str] = &[
    "subrip", "srt", "ass", "ssa", "webvtt", "vtt", "mov_text", "text", "tx3g",
];

const BITMAP_CODECS: &[&str] = &[
    "hdmv_pgs_subtitle",
    "pgssub",
    "dvd_subtitle",
    "dvdsub",
    "dvb_subtitle",
    "xsub",
];

impl SubtitleKind {
    /// Classifies a codec name. `None` for codecs outside both families.
    pub fn from_codec(codec_name: &str) -> Option<Self> {
        let codec = codec_name.to_ascii_lowercase();
        if TEXT_CODECS.contains(&codec.as_str()) {
            Some(Self::Text)
        } else if BITMAP_CODECS.contains(&codec.as_str()) {
            Some(Self::Bitmap)
        } else {
            None
        }
    }
}

/// Why a bitmap track did not make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Bitmap conversion is turned off.
    Disabled,
    /// No recognizer is configured.
    NoRecognizer,
    ExtractionFailed,
    RecognitionFailed,
    NoTextFound,
    /// The converted text could not be written out.
    WriteFailed,
    /// The operator interrupted the batch before the track finished.
    Cancelled,
}

impl SkipReason {
    /// Whether the track was skipped because something went wrong, rather
    /// than by configuration or an interrupt.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Disabled | Self::Cancelled)
    }
}

/// Processing state of a bitmap track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum ConversionOutcome {
    Pending,
    Converted,
    /// Conversion was not done or did not succeed. Never fatal to the job.
    Skipped(SkipReason),
}

/// A subtitle stream with its codec family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub stream: StreamDescriptor,
    /// Fixed by the source codec, never reclassified.
    pub kind: SubtitleKind,
    /// Three-letter language code, `und` when unknown.
    pub language: String,
    /// Set for bitmap tracks only.
    pub outcome: Option<ConversionOutcome>,
}

impl SubtitleTrack {
    pub fn is_text(&self) -> bool {
        self.kind == SubtitleKind::Text
    }

    pub fn is_bitmap(&self) -> bool {
        self.kind == SubtitleKind::Bitmap
    }
}

/// Streams carried into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSelection {
    pub video: StreamDescriptor,
    /// `None` for video-only inputs.
    pub audio: Option<StreamDescriptor>,
    pub subtitles: Vec<SubtitleTrack>,
}

impl StreamSelection {
    pub fn text_tracks(&self) -> impl Iterator<Item = &SubtitleTrack> {
        self.subtitles.iter().filter(|t| t.is_text())
    }

    pub fn bitmap_tracks(&self) -> impl Iterator<Item = &SubtitleTrack> {
        self.subtitles.iter().filter(|t| t.is_bitmap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_family() {
        for codec in ["subrip", "srt", "ass", "ssa", "webvtt", "mov_text", "SUBRIP"] {
            assert_eq!(SubtitleKind::from_codec(codec), Some(SubtitleKind::Text), "{codec}");
        }
    }

    #[test]
    fn test_bitmap_family() {
        for codec in ["hdmv_pgs_subtitle", "pgssub", "dvd_subtitle", "dvb_subtitle", "xsub"] {
            assert_eq!(SubtitleKind::from_codec(codec), Some(SubtitleKind::Bitmap), "{codec}");
        }
    }

    #[test]
    fn test_unknown_codec() {
        assert_eq!(SubtitleKind::from_codec("eia_608"), None);
        assert_eq!(SubtitleKind::from_codec(""), None);
    }

    #[test]
    fn test_cancelled_is_not_a_failure() {
        assert!(!SkipReason::Cancelled.is_failure());
        assert!(!SkipReason::Disabled.is_failure());
        assert!(SkipReason::WriteFailed.is_failure());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&ConversionOutcome::Skipped(SkipReason::NoTextFound)).unwrap();
        assert_eq!(json, r#"{"state":"skipped","reason":"no_text_found"}"#);
        let json = serde_json::to_string(&ConversionOutcome::Converted).unwrap();
        assert_eq!(json, r#"{"state":"converted"}"#);
    }
}
