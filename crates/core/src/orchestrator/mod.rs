//! Batch orchestrator.
//!
//! Runs inputs through the job state machine one at a time:
//! `pending → running → {succeeded, failed}`. A process failure sends the
//! job back to `pending` with the next working encoder; every other failure
//! is terminal for that job but never for the batch.

mod config;
mod output;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use output::{discover_inputs, is_video_file, resolve_output_path, VIDEO_EXTENSIONS};
pub use runner::BatchOrchestrator;
pub use types::{
    BatchSummary, FailureKind, JobFailure, JobReport, OrchestratorError, PreparedJob,
    SkippedSubtitle,
};
