//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use super::encoder::EncoderKind;

/// Errors raised while probing, trial-encoding or transcoding.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The encode process exited unsuccessfully.
    #[error("{} exited with code {}", encoder_label(.encoder), code_label(.code))]
    ProcessFailed {
        encoder: Option<EncoderKind>,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// The process exited cleanly but left no output behind.
    #[error("Output file not created: {path}")]
    OutputMissing { path: PathBuf },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// The job is missing something the command line needs.
    #[error("Invalid transcode job: {reason}")]
    InvalidJob { reason: String },

    /// Subtitle stream extraction failed.
    #[error("Failed to extract subtitle stream {index}: {reason}")]
    ExtractionFailed { index: u32, reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// Operator interrupted the run.
    #[error("Transcode cancelled")]
    Cancelled,
}

fn encoder_label(encoder: &Option<EncoderKind>) -> &'static str {
    encoder.map(|e| e.ffmpeg_name()).unwrap_or("stream copy")
}

fn code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl TranscoderError {
    /// Creates a process failure for the given encoder.
    pub fn process_failed(
        encoder: Option<EncoderKind>,
        code: Option<i32>,
        stderr: Option<String>,
    ) -> Self {
        Self::ProcessFailed {
            encoder,
            code,
            stderr,
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid job error.
    pub fn invalid_job(reason: impl Into<String>) -> Self {
        Self::InvalidJob {
            reason: reason.into(),
        }
    }

    /// Whether another encoder candidate may succeed where this one failed.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::ProcessFailed { .. } | Self::OutputMissing { .. })
    }
}
