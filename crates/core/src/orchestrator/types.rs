//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::converter::{EncoderKind, JobStatus, TranscodeJob, TranscodeMode, TranscoderError};
use crate::diagnostics::Diagnostics;
use crate::metadata::{Metadata, TemplateError};
use crate::streams::SkipReason;

/// Errors that stop a batch before any job runs.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A source path does not exist.
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    /// Sources were given but none is a supported video file.
    #[error("no supported video files found")]
    NoInputs,

    /// The filename pattern does not compile.
    #[error("invalid filename pattern: {0}")]
    Template(#[from] TemplateError),

    /// Reading a source directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a job ended in `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No encoder candidate is left to try.
    EncoderUnavailable,
    /// The encode process failed and no fallback applied.
    TranscodeProcessFailure,
    /// Reading the input or writing the output failed.
    IoFailure,
    /// The input could not be inspected.
    ProbeFailure,
    /// The operator interrupted the job.
    Cancelled,
}

impl FailureKind {
    /// Classifies an executor or probe error.
    pub fn from_error(err: &TranscoderError) -> Self {
        match err {
            TranscoderError::InputNotFound { .. }
            | TranscoderError::ProbeFailed { .. }
            | TranscoderError::ParseError { .. }
            | TranscoderError::FfprobeNotFound { .. } => Self::ProbeFailure,
            TranscoderError::ProcessFailed { .. } | TranscoderError::OutputMissing { .. } => {
                Self::TranscodeProcessFailure
            }
            TranscoderError::Cancelled => Self::Cancelled,
            _ => Self::IoFailure,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EncoderUnavailable => "encoder unavailable",
            Self::TranscodeProcessFailure => "transcode process failure",
            Self::IoFailure => "I/O failure",
            Self::ProbeFailure => "probe failure",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Terminal failure of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Encoder of the last attempt, if one was made.
    pub last_encoder: Option<EncoderKind>,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            last_encoder: None,
        }
    }

    pub fn with_encoder(mut self, encoder: Option<EncoderKind>) -> Self {
        self.last_encoder = encoder;
        self
    }

    pub fn from_error(err: &TranscoderError) -> Self {
        Self::new(FailureKind::from_error(err), err.to_string())
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(encoder) = self.last_encoder {
            write!(f, " (last encoder {})", encoder)?;
        }
        Ok(())
    }
}

/// A bitmap subtitle track left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubtitle {
    pub stream_index: u32,
    pub language: String,
    pub reason: SkipReason,
}

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub input: PathBuf,
    /// Set once the output path was resolved.
    pub output_path: Option<PathBuf>,
    pub mode: Option<TranscodeMode>,
    pub status: JobStatus,
    pub metadata: Option<Metadata>,
    /// Encoder of the successful or last attempt.
    pub encoder: Option<EncoderKind>,
    /// Encode attempts made, fallbacks included.
    pub attempts: u32,
    pub skipped_subtitles: Vec<SkippedSubtitle>,
    pub diagnostics: Diagnostics,
    pub failure: Option<JobFailure>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl JobReport {
    pub(crate) fn new(job_id: String, input: PathBuf) -> Self {
        Self {
            job_id,
            input,
            output_path: None,
            mode: None,
            status: JobStatus::Pending,
            metadata: None,
            encoder: None,
            attempts: 0,
            skipped_subtitles: Vec::new(),
            diagnostics: Diagnostics::new(),
            failure: None,
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    pub fn was_cancelled(&self) -> bool {
        self.failure
            .as_ref()
            .is_some_and(|f| f.kind == FailureKind::Cancelled)
    }
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Reports of every job that started, in batch order.
    pub jobs: Vec<JobReport>,
    /// Inputs never started because the batch was cancelled.
    pub not_started: Vec<PathBuf>,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| j.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| !j.succeeded())
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Skipped subtitle tracks across all jobs, with their input.
    pub fn skipped_subtitles(&self) -> impl Iterator<Item = (&PathBuf, &SkippedSubtitle)> {
        self.jobs
            .iter()
            .flat_map(|j| j.skipped_subtitles.iter().map(move |s| (&j.input, s)))
    }
}

/// A job planned without running it.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedJob {
    pub job: TranscodeJob,
    /// What the executor would run.
    pub command_line: Vec<String>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_from_error() {
        assert_eq!(
            FailureKind::from_error(&TranscoderError::probe_failed("bad")),
            FailureKind::ProbeFailure
        );
        assert_eq!(
            FailureKind::from_error(&TranscoderError::process_failed(None, Some(1), None)),
            FailureKind::TranscodeProcessFailure
        );
        assert_eq!(
            FailureKind::from_error(&TranscoderError::Cancelled),
            FailureKind::Cancelled
        );
        assert_eq!(
            FailureKind::from_error(&TranscoderError::OutputDirectoryFailed {
                path: PathBuf::from("/out")
            }),
            FailureKind::IoFailure
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = JobFailure::new(FailureKind::EncoderUnavailable, "libx265 exited with code 1")
            .with_encoder(Some(EncoderKind::Libx265));
        assert_eq!(
            failure.to_string(),
            "encoder unavailable: libx265 exited with code 1 (last encoder libx265)"
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut ok = JobReport::new("a".into(), PathBuf::from("/in/a.mkv"));
        ok.status = JobStatus::Succeeded;
        let mut bad = JobReport::new("b".into(), PathBuf::from("/in/b.mkv"));
        bad.status = JobStatus::Failed;
        bad.failure = Some(JobFailure::new(FailureKind::ProbeFailure, "corrupt"));
        bad.skipped_subtitles.push(SkippedSubtitle {
            stream_index: 3,
            language: "fra".into(),
            reason: SkipReason::NoTextFound,
        });

        let summary = BatchSummary {
            jobs: vec![ok, bad],
            ..Default::default()
        };
        assert_eq!(summary.succeeded_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.skipped_subtitles().count(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["jobs"][1]["failure"]["kind"], "probe_failure");
        assert_eq!(json["cancelled"], false);
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::InputNotFound(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "input not found: /nope");
    }
}
