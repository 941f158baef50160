//! Video bitrate planning from a target file size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Bits in one megabyte of target size.
pub const BITS_PER_MB: f64 = 8.0 * 1024.0 * 1024.0;
/// Audio budget assumed when sizing the video stream.
pub const AUDIO_BITRATE_BPS: u64 = 192_000;
/// Allowance for container headers and index.
pub const CONTAINER_OVERHEAD_BPS: u64 = 16_000;
/// Below this the encode is not worth watching.
pub const MIN_VIDEO_BITRATE_BPS: u64 = 500_000;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("cannot plan a bitrate for duration {0}s")]
    InvalidDuration(f64),

    #[error("target size must be positive, got {0} MB/h")]
    InvalidTargetSize(f64),
}

/// Planned video bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitratePlan {
    pub video_bitrate_bps: u64,
    /// The size budget was below the floor and the floor was used.
    pub floored: bool,
}

impl BitratePlan {
    pub fn video_kbps(&self) -> u64 {
        self.video_bitrate_bps / 1000
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BitratePlanner {
    audio_bitrate_bps: u64,
    overhead_bps: u64,
    floor_bps: u64,
}

impl Default for BitratePlanner {
    fn default() -> Self {
        Self {
            audio_bitrate_bps: AUDIO_BITRATE_BPS,
            overhead_bps: CONTAINER_OVERHEAD_BPS,
            floor_bps: MIN_VIDEO_BITRATE_BPS,
        }
    }
}

impl BitratePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the configured audio bitrate instead of the default estimate.
    pub fn with_audio_kbps(mut self, kbps: u32) -> Self {
        self.audio_bitrate_bps = u64::from(kbps) * 1000;
        self
    }

    /// Computes the video bitrate that lands the output near
    /// `target_mb_per_hour`, never going under the quality floor.
    ///
    /// Falling under the floor is recorded as a diagnostic, not an error.
    pub fn plan(
        &self,
        duration_secs: f64,
        target_mb_per_hour: f64,
        diagnostics: &mut Diagnostics,
    ) -> Result<BitratePlan, PlanError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(PlanError::InvalidDuration(duration_secs));
        }
        if !target_mb_per_hour.is_finite() || target_mb_per_hour <= 0.0 {
            return Err(PlanError::InvalidTargetSize(target_mb_per_hour));
        }

        let total_bits = target_mb_per_hour * BITS_PER_MB * (duration_secs / 3600.0);
        let total_bps = total_bits / duration_secs;
        let reserved = (self.audio_bitrate_bps + self.overhead_bps) as f64;
        let video_bps = (total_bps - reserved).max(0.0).floor() as u64;

        if video_bps < self.floor_bps {
            diagnostics.emit(
                DiagnosticKind::BitrateFloorApplied,
                format!(
                    "{} MB/h allows only {} kbps of video, using the {} kbps floor; output will exceed the target size",
                    target_mb_per_hour,
                    video_bps / 1000,
                    self.floor_bps / 1000
                ),
            );
            return Ok(BitratePlan {
                video_bitrate_bps: self.floor_bps,
                floored: true,
            });
        }

        Ok(BitratePlan {
            video_bitrate_bps: video_bps,
            floored: false,
        })
    }
}
