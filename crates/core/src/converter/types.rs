//! Types shared by probing, planning and the transcode executor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::encoder::{EncoderCandidate, EncoderKind};
use super::progress::ProgressSnapshot;
use crate::metadata::Metadata;
use crate::streams::StreamSelection;
use crate::subtitles::GeneratedSubtitle;

/// Kind of an elementary stream inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    /// Attachments, data streams and anything else.
    Other,
}

impl StreamKind {
    /// Maps an ffprobe `codec_type`.
    pub fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "subtitle" => Self::Subtitle,
            _ => Self::Other,
        }
    }
}

/// Disposition flags of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub default: bool,
    pub forced: bool,
    /// Embedded cover art rather than a real video stream.
    #[serde(default)]
    pub attached_pic: bool,
}

/// One stream as reported by the inspection tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Absolute stream index in the container.
    pub index: u32,
    pub kind: StreamKind,
    pub codec_name: String,
    /// Raw language tag, if any.
    pub language: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub disposition: Disposition,
}

impl StreamDescriptor {
    pub fn new(index: u32, kind: StreamKind, codec_name: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            codec_name: codec_name.into(),
            language: None,
            title: None,
            disposition: Disposition::default(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_default(mut self) -> Self {
        self.disposition.default = true;
        self
    }

    pub fn with_forced(mut self) -> Self {
        self.disposition.forced = true;
        self
    }
}

/// A probed input file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Container duration in seconds, 0 when unknown.
    pub duration_secs: f64,
    /// Streams in container order.
    pub streams: Vec<StreamDescriptor>,
}

impl MediaFile {
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(move |s| s.kind == kind)
    }
}

/// Whether the video is re-encoded or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    Transcode,
    Rewrap,
}

impl std::fmt::Display for TranscodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transcode => write!(f, "transcode"),
            Self::Rewrap => write!(f, "rewrap"),
        }
    }
}

/// Lifecycle of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Everything needed to produce one output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub job_id: String,
    pub media: MediaFile,
    pub output_path: PathBuf,
    pub mode: TranscodeMode,
    pub target_size_mb_per_hour: f64,
    pub metadata: Metadata,
    pub selection: StreamSelection,
    /// Text subtitles produced from bitmap tracks.
    pub generated_subtitles: Vec<GeneratedSubtitle>,
    /// Planned video bitrate, `None` in rewrap mode.
    pub video_bitrate_bps: Option<u64>,
    pub audio_bitrate_kbps: u32,
    /// Encoder used for this attempt, `None` in rewrap mode.
    pub encoder: Option<EncoderCandidate>,
    pub status: JobStatus,
}

impl TranscodeJob {
    pub fn encoder_kind(&self) -> Option<EncoderKind> {
        self.encoder.map(|c| c.kind)
    }
}

/// Result of a successful encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub elapsed_ms: u64,
    pub encoder: Option<EncoderKind>,
    /// Last progress record seen before exit.
    pub last_progress: Option<ProgressSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaFile {
        MediaFile {
            path: PathBuf::from("/in/movie.mkv"),
            duration_secs: 5400.0,
            streams: vec![
                StreamDescriptor::new(0, StreamKind::Video, "h264"),
                StreamDescriptor::new(1, StreamKind::Audio, "aac").with_language("eng"),
                StreamDescriptor::new(2, StreamKind::Audio, "ac3").with_default(),
                StreamDescriptor::new(3, StreamKind::Subtitle, "subrip"),
            ],
        }
    }

    #[test]
    fn test_streams_of() {
        let media = media();
        let audio: Vec<u32> = media.streams_of(StreamKind::Audio).map(|s| s.index).collect();
        assert_eq!(audio, vec![1, 2]);
        assert_eq!(media.streams_of(StreamKind::Other).count(), 0);
    }

    #[test]
    fn test_stream_kind_from_codec_type() {
        assert_eq!(StreamKind::from_codec_type("video"), StreamKind::Video);
        assert_eq!(StreamKind::from_codec_type("subtitle"), StreamKind::Subtitle);
        assert_eq!(StreamKind::from_codec_type("attachment"), StreamKind::Other);
    }

    #[test]
    fn test_descriptor_builders() {
        let stream = StreamDescriptor::new(4, StreamKind::Subtitle, "hdmv_pgs_subtitle")
            .with_language("ger")
            .with_forced();
        assert_eq!(stream.language.as_deref(), Some("ger"));
        assert!(stream.disposition.forced);
        assert!(!stream.disposition.default);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&TranscodeMode::Rewrap).unwrap(),
            "\"rewrap\""
        );
        assert_eq!(TranscodeMode::Transcode.to_string(), "transcode");
    }
}
