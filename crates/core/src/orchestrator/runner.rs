//! Batch orchestrator implementation.
//!
//! Jobs run one after another so two encodes never compete for the same
//! hardware encoder. Each job goes through:
//! - Probe and metadata extraction
//! - Stream classification and mode selection
//! - Bitmap subtitle conversion (bounded worker pool)
//! - Bitrate planning (transcode mode only)
//! - Encode, falling back to the next working encoder on process failure

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::converter::{
    CapabilityProber, CapabilityTable, JobStatus, ProgressSnapshot, TranscodeJob, TranscodeMode,
    Transcoder, TranscoderError,
};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::metadata::MetadataExtractor;
use crate::metrics;
use crate::planner::BitratePlanner;
use crate::streams::{classify, is_rewrap_compatible, ConversionOutcome, SkipReason};
use crate::subtitles::{SubtitleConverter, TextRecognizer};

use super::config::OrchestratorConfig;
use super::output::resolve_output_path;
use super::types::{
    BatchSummary, FailureKind, JobFailure, JobReport, OrchestratorError, PreparedJob,
    SkippedSubtitle,
};

/// Drives a batch of inputs through probing, planning and encoding.
pub struct BatchOrchestrator {
    config: OrchestratorConfig,
    transcoder: Arc<dyn Transcoder>,
    prober: CapabilityProber,
    extractor: MetadataExtractor,
    planner: BitratePlanner,
    subtitles: SubtitleConverter,
    cancel: CancelSignal,
    progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
}

impl BatchOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        transcoder: Arc<dyn Transcoder>,
        prober: CapabilityProber,
        extractor: MetadataExtractor,
        subtitles: SubtitleConverter,
    ) -> Self {
        let planner = BitratePlanner::new().with_audio_kbps(config.audio_bitrate_kbps);
        Self {
            config,
            transcoder,
            prober,
            extractor,
            planner,
            subtitles,
            cancel: CancelSignal::new(),
            progress_tx: None,
        }
    }

    /// Wires every component from the loaded configuration.
    pub fn from_config(
        config: &Config,
        transcoder: Arc<dyn Transcoder>,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Result<Self, OrchestratorError> {
        let mut extractor =
            MetadataExtractor::new().with_category_override(config.metadata.media_type);
        if let Some(ref pattern) = config.metadata.filename_pattern {
            extractor = extractor.with_template(pattern)?;
        }

        let prober = CapabilityProber::new(transcoder.clone(), config.encoders.allow_hardware);
        let subtitles = SubtitleConverter::new(transcoder.clone(), recognizer)
            .with_enabled(config.subtitles.convert_bitmap)
            .with_max_workers(config.subtitles.max_workers);

        Ok(Self::new(
            OrchestratorConfig::from(config),
            transcoder,
            prober,
            extractor,
            subtitles,
        ))
    }

    /// Uses `cancel` instead of the orchestrator's own signal.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sends progress of every encode to `tx`.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressSnapshot>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Probes encoders once. Later calls return the memoized table.
    pub async fn capabilities(&self) -> CapabilityTable {
        self.prober.probe().await
    }

    /// Runs every input in order.
    ///
    /// A failed job never stops the batch. Cancellation stops scheduling;
    /// the remaining inputs are listed as not started.
    pub async fn run_batch(&self, inputs: &[PathBuf]) -> BatchSummary {
        let table = self.capabilities().await;
        info!(
            inputs = inputs.len(),
            encoder = ?table.first_available().map(|c| c.kind),
            "Starting batch"
        );

        let mut summary = BatchSummary::default();
        for (position, input) in inputs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                summary.not_started = inputs[position..].to_vec();
                break;
            }

            let report = self.run_job(input, &table).await;
            let cancelled = report.was_cancelled();
            summary.jobs.push(report);

            if cancelled {
                summary.cancelled = true;
                summary.not_started = inputs[position + 1..].to_vec();
                break;
            }
        }

        if summary.cancelled {
            warn!(
                not_started = summary.not_started.len(),
                "Batch cancelled by operator"
            );
        }
        info!(
            succeeded = summary.succeeded_count(),
            failed = summary.failed_count(),
            "Batch finished"
        );
        summary
    }

    /// Plans every input without encoding or converting subtitles.
    pub async fn dry_run(&self, inputs: &[PathBuf]) -> Vec<(PathBuf, Result<PreparedJob, JobFailure>)> {
        let table = self.capabilities().await;
        let mut planned = Vec::with_capacity(inputs.len());

        for input in inputs {
            let mut diagnostics = Diagnostics::new();
            let result = match self
                .prepare(new_job_id(), input, &table, &mut diagnostics)
                .await
            {
                Ok(job) => self
                    .transcoder
                    .command_line(&job)
                    .map(|command_line| PreparedJob {
                        job,
                        command_line,
                        diagnostics,
                    })
                    .map_err(|e| JobFailure::from_error(&e)),
                Err(failure) => Err(failure),
            };
            planned.push((input.clone(), result));
        }
        planned
    }

    /// Runs one input to a terminal status. Never returns an error: every
    /// failure ends up on the report.
    pub async fn run_job(&self, input: &Path, table: &CapabilityTable) -> JobReport {
        let started = Instant::now();
        let mut report = JobReport::new(new_job_id(), input.to_path_buf());
        info!(job_id = %report.job_id, input = %input.display(), "Starting job");

        let result = self.execute(input, table, &mut report).await;
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                report.status = JobStatus::Succeeded;
                metrics::JOBS_TOTAL.with_label_values(&["succeeded"]).inc();
                info!(
                    job_id = %report.job_id,
                    output = ?report.output_path,
                    encoder = ?report.encoder,
                    elapsed_ms = report.elapsed_ms,
                    "Job succeeded"
                );
            }
            Err(failure) => {
                report.status = JobStatus::Failed;
                let label = if failure.kind == FailureKind::Cancelled {
                    "cancelled"
                } else {
                    "failed"
                };
                metrics::JOBS_TOTAL.with_label_values(&[label]).inc();
                error!(job_id = %report.job_id, input = %input.display(), "Job failed: {}", failure);
                report.failure = Some(failure);
            }
        }
        report
    }

    async fn execute(
        &self,
        input: &Path,
        table: &CapabilityTable,
        report: &mut JobReport,
    ) -> Result<(), JobFailure> {
        let mut job = self
            .prepare(report.job_id.clone(), input, table, &mut report.diagnostics)
            .await?;
        report.metadata = Some(job.metadata.clone());
        report.output_path = Some(job.output_path.clone());
        report.mode = Some(job.mode);

        // Held until the encode is done; the generated subtitles live here.
        let _scratch = self.convert_subtitles(&mut job, report).await;

        if self.cancel.is_cancelled() {
            return Err(JobFailure::new(
                FailureKind::Cancelled,
                "cancelled before encoding",
            ));
        }

        self.encode(&mut job, table, report).await
    }

    /// Builds a pending job: probe, metadata, stream selection, mode,
    /// bitrate, first encoder and output path.
    pub async fn prepare(
        &self,
        job_id: String,
        input: &Path,
        table: &CapabilityTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<TranscodeJob, JobFailure> {
        let media = self
            .transcoder
            .probe(input)
            .await
            .map_err(|e| JobFailure::from_error(&e))?;

        let metadata = self
            .extractor
            .extract(&input.to_string_lossy(), diagnostics);

        let selection = classify(&media.streams, diagnostics)
            .map_err(|e| JobFailure::new(FailureKind::ProbeFailure, e.to_string()))?;

        let mode = self.config.mode.fixed().unwrap_or_else(|| {
            if is_rewrap_compatible(&selection) {
                TranscodeMode::Rewrap
            } else {
                TranscodeMode::Transcode
            }
        });

        let (video_bitrate_bps, encoder) = match mode {
            TranscodeMode::Rewrap => (None, None),
            TranscodeMode::Transcode => {
                let plan = self
                    .planner
                    .plan(
                        media.duration_secs,
                        self.config.target_size_mb_per_hour,
                        diagnostics,
                    )
                    .map_err(|e| JobFailure::new(FailureKind::ProbeFailure, e.to_string()))?;
                let encoder = table.first_available().ok_or_else(|| {
                    JobFailure::new(
                        FailureKind::EncoderUnavailable,
                        "no encoder candidate is available",
                    )
                })?;
                (Some(plan.video_bitrate_bps), Some(encoder))
            }
        };

        let output_path =
            resolve_output_path(input, self.config.output_dir.as_deref(), self.config.overwrite);

        debug!(
            job_id = %job_id,
            mode = %mode,
            bitrate = ?video_bitrate_bps,
            output = %output_path.display(),
            "Prepared job"
        );

        Ok(TranscodeJob {
            job_id,
            media,
            output_path,
            mode,
            target_size_mb_per_hour: self.config.target_size_mb_per_hour,
            metadata,
            selection,
            generated_subtitles: Vec::new(),
            video_bitrate_bps,
            audio_bitrate_kbps: self.config.audio_bitrate_kbps,
            encoder,
            status: JobStatus::Pending,
        })
    }

    /// Converts bitmap tracks in place on the job. Returns the scratch
    /// directory, which must outlive the encode.
    async fn convert_subtitles(&self, job: &mut TranscodeJob, report: &mut JobReport) -> Option<TempDir> {
        if job.selection.bitmap_tracks().next().is_none() {
            return None;
        }

        let input = &job.media.path;
        let tracks = &job.selection.subtitles;
        let (conversion, scratch) = if !self.subtitles.is_enabled() {
            let conversion = self
                .subtitles
                .convert_tracks(input, &self.config.work_dir, tracks, &self.cancel)
                .await;
            (conversion, None)
        } else {
            match self.scratch_dir(&job.job_id).await {
                Ok(dir) => {
                    let conversion = self
                        .subtitles
                        .convert_tracks(input, dir.path(), tracks, &self.cancel)
                        .await;
                    (conversion, Some(dir))
                }
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "Cannot create scratch directory");
                    let conversion = self.subtitles.skip_tracks(
                        tracks,
                        SkipReason::WriteFailed,
                        &format!("cannot create scratch directory: {}", e),
                    );
                    (conversion, None)
                }
            }
        };

        for track in &conversion.tracks {
            if let Some(ConversionOutcome::Skipped(reason)) = track.outcome {
                report.skipped_subtitles.push(SkippedSubtitle {
                    stream_index: track.stream.index,
                    language: track.language.clone(),
                    reason,
                });
            }
        }
        job.selection.subtitles = conversion.tracks;
        job.generated_subtitles = conversion.generated;
        report.diagnostics.absorb(conversion.diagnostics);

        scratch
    }

    async fn scratch_dir(&self, job_id: &str) -> std::io::Result<TempDir> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        tempfile::Builder::new()
            .prefix(&format!("{}-", job_id))
            .tempdir_in(&self.config.work_dir)
    }

    /// Runs the encode, moving down the candidate list on process failure.
    async fn encode(
        &self,
        job: &mut TranscodeJob,
        table: &CapabilityTable,
        report: &mut JobReport,
    ) -> Result<(), JobFailure> {
        loop {
            job.status = JobStatus::Running;
            let encoder = job.encoder_kind();
            report.encoder = encoder;
            report.attempts += 1;
            let label = encoder.map(|e| e.ffmpeg_name()).unwrap_or("copy");
            info!(job_id = %job.job_id, encoder = label, mode = %job.mode, "Running encode");

            let started = Instant::now();
            let result = self
                .transcoder
                .run(job, self.progress_tx.clone(), &self.cancel)
                .await;

            let err = match result {
                Ok(outcome) => {
                    job.status = JobStatus::Succeeded;
                    metrics::ENCODER_ATTEMPTS
                        .with_label_values(&[label, "succeeded"])
                        .inc();
                    let mode = job.mode.to_string();
                    metrics::TRANSCODE_DURATION
                        .with_label_values(&[mode.as_str()])
                        .observe(started.elapsed().as_secs_f64());
                    report.output_path = Some(outcome.output_path);
                    return Ok(());
                }
                Err(err) => err,
            };

            job.status = JobStatus::Failed;
            metrics::ENCODER_ATTEMPTS
                .with_label_values(&[label, "failed"])
                .inc();

            if !err.is_process_failure() {
                return Err(JobFailure::from_error(&err).with_encoder(encoder));
            }
            if let TranscoderError::ProcessFailed {
                stderr: Some(ref stderr),
                ..
            } = err
            {
                debug!(job_id = %job.job_id, encoder = label, "ffmpeg stderr:\n{}", stderr);
            }

            let Some(failed) = encoder else {
                return Err(JobFailure::from_error(&err));
            };

            match table.next_available_after(failed) {
                Some(next) => {
                    report.diagnostics.emit(
                        DiagnosticKind::EncoderFallback,
                        format!("{} failed ({}), retrying with {}", failed, err, next.kind),
                    );
                    metrics::ENCODER_FALLBACKS.inc();
                    job.encoder = Some(next);
                    job.status = JobStatus::Pending;
                }
                None => {
                    return Err(JobFailure::new(
                        FailureKind::EncoderUnavailable,
                        format!("no encoder left after {} failed: {}", failed, err),
                    )
                    .with_encoder(Some(failed)));
                }
            }
        }
    }
}

fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
