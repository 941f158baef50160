//! HEVC encoder backends and their command-line shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One encoding backend the executor can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// NVIDIA NVENC.
    HevcNvenc,
    /// AMD AMF.
    HevcAmf,
    /// Intel Quick Sync.
    HevcQsv,
    /// Apple VideoToolbox.
    HevcVideotoolbox,
    /// Software x265, always available.
    Libx265,
}

impl EncoderKind {
    /// Encoder name as passed to `-c:v`.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::HevcNvenc => "hevc_nvenc",
            Self::HevcAmf => "hevc_amf",
            Self::HevcQsv => "hevc_qsv",
            Self::HevcVideotoolbox => "hevc_videotoolbox",
            Self::Libx265 => "libx265",
        }
    }

    /// Human readable backend name.
    pub fn vendor(&self) -> &'static str {
        match self {
            Self::HevcNvenc => "NVIDIA",
            Self::HevcAmf => "AMD",
            Self::HevcQsv => "Intel",
            Self::HevcVideotoolbox => "Apple VideoToolbox",
            Self::Libx265 => "CPU",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::Libx265)
    }

    /// Rate control and quality flags for this backend.
    pub fn codec_args(&self, cpu_preset: &str) -> Vec<String> {
        let args: Vec<&str> = match self {
            Self::HevcNvenc => vec!["-preset", "p4", "-rc", "vbr"],
            Self::HevcAmf => vec!["-quality", "balanced", "-rc", "vbr_peak"],
            Self::HevcQsv => vec!["-preset", "medium", "-global_quality", "23"],
            Self::HevcVideotoolbox => vec!["-quality", "1"],
            Self::Libx265 => vec!["-preset", cpu_preset],
        };
        args.into_iter().map(String::from).collect()
    }

    /// Candidates for the current platform, fastest first. The CPU encoder is
    /// always last.
    pub fn platform_priority() -> &'static [EncoderKind] {
        if cfg!(target_os = "macos") {
            &[Self::HevcVideotoolbox, Self::Libx265]
        } else {
            &[Self::HevcNvenc, Self::HevcAmf, Self::HevcQsv, Self::Libx265]
        }
    }

    pub fn from_ffmpeg_name(name: &str) -> Option<Self> {
        match name {
            "hevc_nvenc" => Some(Self::HevcNvenc),
            "hevc_amf" => Some(Self::HevcAmf),
            "hevc_qsv" => Some(Self::HevcQsv),
            "hevc_videotoolbox" => Some(Self::HevcVideotoolbox),
            "libx265" => Some(Self::Libx265),
            _ => None,
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

/// Result of probing an encoder on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Untested,
    Available,
    Unavailable,
}

/// An encoder together with its rank and probed availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCandidate {
    pub kind: EncoderKind,
    /// Position in the priority order, 0 is tried first.
    pub rank: usize,
    pub availability: Availability,
}

impl EncoderCandidate {
    pub fn new(kind: EncoderKind, rank: usize) -> Self {
        Self {
            kind,
            rank,
            availability: Availability::Untested,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}
