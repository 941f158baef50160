//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use super::fixtures;
use crate::cancel::CancelSignal;
use crate::converter::{
    EncoderKind, MediaFile, ProgressSnapshot, StreamDescriptor, TranscodeJob, TranscodeMode,
    TranscodeOutcome, Transcoder, TranscoderError,
};
use crate::subtitles::GeneratedSubtitle;

/// A recorded encode attempt for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub job_id: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: TranscodeMode,
    pub encoder: Option<EncoderKind>,
    pub video_bitrate_bps: Option<u64>,
    pub generated_subtitles: Vec<GeneratedSubtitle>,
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Provides controllable behavior for testing:
/// - Track encode attempts for assertions
/// - Make specific encoders fail their trial or their encodes
/// - Control probe results and probe failures
/// - Simulate operator cancellation during a given input
///
/// Hardware trials fail unless enabled with [`set_trial_available`].
///
/// [`set_trial_available`]: MockTranscoder::set_trial_available
///
/// # Example
///
/// ```rust,ignore
/// use oneshot_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.set_trial_available(EncoderKind::HevcQsv, true).await;
/// transcoder.fail_encoder(EncoderKind::HevcQsv).await;
///
/// // ... run a batch ...
///
/// let runs = transcoder.recorded_runs().await;
/// assert_eq!(runs.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    runs: Arc<RwLock<Vec<RecordedRun>>>,
    trials: Arc<RwLock<Vec<EncoderKind>>>,
    trial_available: Arc<RwLock<HashMap<EncoderKind, bool>>>,
    failing_encoders: Arc<RwLock<HashSet<EncoderKind>>>,
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaFile>>>,
    probe_errors: Arc<RwLock<HashMap<PathBuf, String>>>,
    cancel_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    failing_extractions: Arc<RwLock<HashSet<u32>>>,
    extracted: Arc<RwLock<Vec<(u32, PathBuf)>>>,
    next_error: Arc<RwLock<Option<TranscoderError>>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded encode attempts.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    /// Encoders that went through a trial encode, in order.
    pub async fn trials(&self) -> Vec<EncoderKind> {
        self.trials.read().await.clone()
    }

    /// Subtitle streams extracted so far as `(index, destination)`.
    pub async fn extracted(&self) -> Vec<(u32, PathBuf)> {
        self.extracted.read().await.clone()
    }

    /// Make the trial encode of a hardware encoder pass or fail.
    pub async fn set_trial_available(&self, encoder: EncoderKind, available: bool) {
        self.trial_available.write().await.insert(encoder, available);
    }

    /// Make every encode with `encoder` exit with a process failure.
    pub async fn fail_encoder(&self, encoder: EncoderKind) {
        self.failing_encoders.write().await.insert(encoder);
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, media: MediaFile) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), media);
    }

    /// Make probing `path` fail.
    pub async fn set_probe_error(&self, path: impl AsRef<Path>, reason: impl Into<String>) {
        self.probe_errors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), reason.into());
    }

    /// Fire the cancel signal while encoding `path`, as if the operator
    /// pressed ctrl-c mid-encode.
    pub async fn cancel_during(&self, path: impl AsRef<Path>) {
        self.cancel_inputs
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Make extraction of subtitle stream `index` fail.
    pub async fn fail_extraction(&self, index: u32) {
        self.failing_extractions.write().await.insert(index);
    }

    /// Configure the next encode to fail with the given error.
    pub async fn set_next_error(&self, error: TranscoderError) {
        *self.next_error.write().await = Some(error);
    }

    async fn record(&self, job: &TranscodeJob, success: bool) {
        self.runs.write().await.push(RecordedRun {
            job_id: job.job_id.clone(),
            input: job.media.path.clone(),
            output: job.output_path.clone(),
            mode: job.mode,
            encoder: job.encoder_kind(),
            video_bitrate_bps: job.video_bitrate_bps,
            generated_subtitles: job.generated_subtitles.clone(),
            success,
        });
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaFile, TranscoderError> {
        if let Some(reason) = self.probe_errors.read().await.get(path) {
            return Err(TranscoderError::probe_failed(reason.clone()));
        }
        if let Some(media) = self.probe_results.read().await.get(path) {
            return Ok(media.clone());
        }
        Ok(fixtures::media_file(path, 3600.0))
    }

    async fn trial_encode(&self, encoder: EncoderKind) -> Result<(), TranscoderError> {
        self.trials.write().await.push(encoder);
        let available = self
            .trial_available
            .read()
            .await
            .get(&encoder)
            .copied()
            .unwrap_or(!encoder.is_hardware());
        if available {
            Ok(())
        } else {
            Err(TranscoderError::process_failed(Some(encoder), Some(1), None))
        }
    }

    async fn extract_subtitle(
        &self,
        _input: &Path,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> Result<(), TranscoderError> {
        if self.failing_extractions.read().await.contains(&stream.index) {
            return Err(TranscoderError::ExtractionFailed {
                index: stream.index,
                reason: "mock extraction failure".to_string(),
            });
        }
        tokio::fs::write(dest, b"mock subtitle").await?;
        self.extracted
            .write()
            .await
            .push((stream.index, dest.to_path_buf()));
        Ok(())
    }

    async fn run(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
        cancel: &CancelSignal,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        if let Some(err) = self.next_error.write().await.take() {
            self.record(job, false).await;
            return Err(err);
        }

        if self.cancel_inputs.read().await.contains(&job.media.path) {
            cancel.cancel();
            self.record(job, false).await;
            return Err(TranscoderError::Cancelled);
        }

        if let Some(encoder) = job.encoder_kind() {
            if self.failing_encoders.read().await.contains(&encoder) {
                self.record(job, false).await;
                return Err(TranscoderError::process_failed(
                    Some(encoder),
                    Some(1),
                    Some(format!("mock {} failure", encoder)),
                ));
            }
        }

        let snapshot = ProgressSnapshot {
            job_id: job.job_id.clone(),
            percent: 100.0,
            position_secs: job.media.duration_secs,
            elapsed_secs: 0.0,
            size_bytes: None,
            speed: Some(10.0),
        };
        if let Some(tx) = progress_tx {
            let _ = tx.send(snapshot.clone()).await;
        }

        self.record(job, true).await;
        Ok(TranscodeOutcome {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: 0,
            elapsed_ms: 0,
            encoder: job.encoder_kind(),
            last_progress: Some(snapshot),
        })
    }

    fn command_line(&self, job: &TranscodeJob) -> Result<Vec<String>, TranscoderError> {
        Ok(vec![
            "mock".to_string(),
            job.media.path.to_string_lossy().to_string(),
            job.output_path.to_string_lossy().to_string(),
        ])
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        Ok(())
    }
}
