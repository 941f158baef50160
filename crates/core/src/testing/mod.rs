//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the external toolchain so batches can be driven end to
//! end without ffmpeg or a recognition engine installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use oneshot_core::testing::{MockRecognizer, MockTranscoder};
//!
//! let transcoder = MockTranscoder::new();
//! let recognizer = MockRecognizer::new();
//!
//! // Configure mock behavior
//! transcoder.set_trial_available(EncoderKind::HevcNvenc, true).await;
//! transcoder.fail_extraction(3).await;
//!
//! // Use in a BatchOrchestrator...
//! ```

mod mock_recognizer;
mod mock_transcoder;

pub use mock_recognizer::MockRecognizer;
pub use mock_transcoder::{MockTranscoder, RecordedRun};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::converter::{
        Availability, EncoderCandidate, EncoderKind, JobStatus, MediaFile, StreamDescriptor,
        StreamKind, TranscodeJob, TranscodeMode,
    };
    use crate::diagnostics::Diagnostics;
    use crate::metadata::MetadataExtractor;
    use crate::streams::{ConversionOutcome, StreamSelection, SubtitleKind, SubtitleTrack};

    /// One h264 video, one default English AAC track, an English SubRip
    /// track and a French PGS track.
    pub fn sample_streams() -> Vec<StreamDescriptor> {
        vec![
            StreamDescriptor::new(0, StreamKind::Video, "h264"),
            StreamDescriptor::new(1, StreamKind::Audio, "aac")
                .with_language("eng")
                .with_default(),
            StreamDescriptor::new(2, StreamKind::Subtitle, "subrip").with_language("eng"),
            StreamDescriptor::new(3, StreamKind::Subtitle, "hdmv_pgs_subtitle")
                .with_language("fre"),
        ]
    }

    /// A probed file with [`sample_streams`].
    pub fn media_file(path: impl AsRef<Path>, duration_secs: f64) -> MediaFile {
        MediaFile {
            path: path.as_ref().to_path_buf(),
            duration_secs,
            streams: sample_streams(),
        }
    }

    /// The selection `classify` produces for [`sample_streams`].
    pub fn sample_selection() -> StreamSelection {
        let streams = sample_streams();
        StreamSelection {
            video: streams[0].clone(),
            audio: Some(streams[1].clone()),
            subtitles: vec![
                SubtitleTrack {
                    stream: streams[2].clone(),
                    kind: SubtitleKind::Text,
                    language: "eng".to_string(),
                    outcome: None,
                },
                SubtitleTrack {
                    stream: streams[3].clone(),
                    kind: SubtitleKind::Bitmap,
                    language: "fra".to_string(),
                    outcome: Some(ConversionOutcome::Pending),
                },
            ],
        }
    }

    /// A one hour x265 transcode at 900 MB/h.
    pub fn transcode_job(input: &str, output: &str) -> TranscodeJob {
        let mut diagnostics = Diagnostics::new();
        TranscodeJob {
            job_id: "job-1".to_string(),
            media: media_file(input, 3600.0),
            output_path: output.into(),
            mode: TranscodeMode::Transcode,
            target_size_mb_per_hour: 900.0,
            metadata: MetadataExtractor::new().extract(input, &mut diagnostics),
            selection: sample_selection(),
            generated_subtitles: Vec::new(),
            video_bitrate_bps: Some(1_889_152),
            audio_bitrate_kbps: 192,
            encoder: Some(EncoderCandidate {
                kind: EncoderKind::Libx265,
                rank: 0,
                availability: Availability::Available,
            }),
            status: JobStatus::Pending,
        }
    }

    /// The same input copied into MP4 without re-encoding.
    pub fn rewrap_job(input: &str, output: &str) -> TranscodeJob {
        let mut job = transcode_job(input, output);
        job.mode = TranscodeMode::Rewrap;
        job.video_bitrate_bps = None;
        job.encoder = None;
        job
    }
}
