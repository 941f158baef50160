//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::encoder::EncoderKind;
use super::error::TranscoderError;
use super::progress::ProgressSnapshot;
use super::types::{MediaFile, StreamDescriptor, TranscodeJob, TranscodeOutcome};
use crate::cancel::CancelSignal;

/// The external multimedia toolchain.
///
/// Inspection, encoder trials, subtitle extraction and the encode itself all
/// go through this seam so the orchestrator can be driven by a mock in tests.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Reads duration and stream list of an input file.
    async fn probe(&self, path: &Path) -> Result<MediaFile, TranscoderError>;

    /// Encodes a few synthetic frames with `encoder`. `Ok` means the encoder
    /// works on this machine.
    async fn trial_encode(&self, encoder: EncoderKind) -> Result<(), TranscoderError>;

    /// Copies one subtitle stream out of `input` into `dest`.
    async fn extract_subtitle(
        &self,
        input: &Path,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> Result<(), TranscoderError>;

    /// Runs one encode attempt to completion.
    ///
    /// Progress records are sent as they arrive; a full channel drops records
    /// rather than stalling the encode. When `cancel` fires the process is
    /// asked to finish its output and `TranscoderError::Cancelled` is returned.
    async fn run(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
        cancel: &CancelSignal,
    ) -> Result<TranscodeOutcome, TranscoderError>;

    /// The command line `run` would execute, for dry runs.
    fn command_line(&self, job: &TranscodeJob) -> Result<Vec<String>, TranscoderError>;

    /// Validates that the toolchain is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
