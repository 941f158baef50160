//! Converter module for probing and transcoding media files.
//!
//! This module provides the `Transcoder` trait and the ffmpeg-backed
//! implementation, plus encoder capability probing.
//!
//! # Features
//!
//! - HEVC encoding on NVIDIA, AMD, Intel or Apple hardware, with x265 as the
//!   always-available fallback
//! - Stream copy ("rewrap") into MP4
//! - Metadata and subtitle language tagging
//! - Live progress from ffmpeg's `-progress` channel
//!
//! # Example
//!
//! ```ignore
//! use oneshot_core::converter::{CapabilityProber, FfmpegTranscoder, Transcoder};
//!
//! let transcoder = Arc::new(FfmpegTranscoder::with_defaults());
//!
//! // Validate ffmpeg is available
//! transcoder.validate().await?;
//!
//! // Find working encoders
//! let table = CapabilityProber::new(transcoder.clone(), true).probe().await;
//! println!("Using {:?}", table.first_available());
//!
//! // Probe a media file
//! let media = transcoder.probe(Path::new("/path/to/file.mkv")).await?;
//! println!("Duration: {} seconds", media.duration_secs);
//! ```

mod capabilities;
mod config;
mod encoder;
mod error;
mod ffmpeg;
mod progress;
mod traits;
mod types;

pub use capabilities::{CapabilityProber, CapabilityTable};
pub use config::ConverterConfig;
pub use encoder::{Availability, EncoderCandidate, EncoderKind};
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use progress::{parse_clock, ProgressParser, ProgressRecord, ProgressSnapshot};
pub use traits::Transcoder;
pub use types::{
    Disposition, JobStatus, MediaFile, StreamDescriptor, StreamKind, TranscodeJob,
    TranscodeMode, TranscodeOutcome,
};
