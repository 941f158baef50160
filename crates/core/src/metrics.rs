//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs and batches (results, transcode duration)
//! - Encoders (attempts per encoder, fallbacks)
//! - Subtitle conversion

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Finished jobs by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("oneshot_jobs_total", "Total jobs by terminal result"),
        &["result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Wall time of successful encodes.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "oneshot_transcode_duration_seconds",
            "Duration of successful encode runs",
        )
        .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0]),
        &["mode"], // "transcode", "rewrap"
    )
    .unwrap()
});

// =============================================================================
// Encoders
// =============================================================================

/// Encode attempts by encoder and result.
pub static ENCODER_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "oneshot_encoder_attempts_total",
            "Total encode attempts by encoder",
        ),
        &["encoder", "result"], // result: "succeeded", "failed"
    )
    .unwrap()
});

/// Times a job moved on to the next encoder candidate.
pub static ENCODER_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "oneshot_encoder_fallbacks_total",
        "Total fallbacks to the next encoder candidate",
    )
    .unwrap()
});

// =============================================================================
// Subtitles
// =============================================================================

/// Bitmap subtitle conversions by result.
pub static SUBTITLE_CONVERSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "oneshot_subtitle_conversions_total",
            "Total bitmap subtitle conversions by result",
        ),
        &["result"], // "converted", "skipped"
    )
    .unwrap()
});

/// Register all metrics with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
        Box::new(ENCODER_ATTEMPTS.clone()),
        Box::new(ENCODER_FALLBACKS.clone()),
        Box::new(SUBTITLE_CONVERSIONS.clone()),
    ]
}
