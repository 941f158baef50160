pub mod cancel;
pub mod config;
pub mod converter;
pub mod diagnostics;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod planner;
pub mod streams;
pub mod subtitles;
pub mod testing;

pub use cancel::CancelSignal;
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, ModePreference,
};
pub use converter::{
    CapabilityProber, CapabilityTable, EncoderKind, FfmpegTranscoder, MediaFile,
    ProgressSnapshot, TranscodeJob, TranscodeMode, Transcoder, TranscoderError,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use metadata::{Category, Metadata, MetadataExtractor};
pub use orchestrator::{
    discover_inputs, BatchOrchestrator, BatchSummary, FailureKind, JobFailure, JobReport,
    OrchestratorError, PreparedJob,
};
pub use planner::{BitratePlan, BitratePlanner, PlanError};
pub use subtitles::{CommandRecognizer, SubtitleConverter, TextRecognizer};
