use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::{ConverterConfig, TranscodeMode};
use crate::metadata::Category;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub subtitles: SubtitleConfig,
    #[serde(default)]
    pub encoders: EncoderConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// How the video stream is produced.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    /// Always re-encode.
    #[default]
    Transcode,
    /// Always copy the streams.
    Rewrap,
    /// Copy when the source codecs are already compatible, re-encode otherwise.
    Auto,
}

impl ModePreference {
    /// The fixed mode, or `None` when it depends on the input.
    pub fn fixed(&self) -> Option<TranscodeMode> {
        match self {
            Self::Transcode => Some(TranscodeMode::Transcode),
            Self::Rewrap => Some(TranscodeMode::Rewrap),
            Self::Auto => None,
        }
    }
}

/// Output and sizing options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    #[serde(default)]
    pub mode: ModePreference,
    /// Desired output size per hour of source.
    #[serde(default = "default_target_size")]
    pub target_size_mb_per_hour: f64,
    /// Output directory (default: next to each input)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Replace existing outputs instead of picking a free name
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            mode: ModePreference::default(),
            target_size_mb_per_hour: default_target_size(),
            output_dir: None,
            overwrite: false,
            audio_bitrate_kbps: default_audio_bitrate(),
        }
    }
}

fn default_target_size() -> f64 {
    900.0
}

fn default_audio_bitrate() -> u32 {
    192
}

/// Filename metadata options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Override template tried before the built-in patterns
    #[serde(default)]
    pub filename_pattern: Option<String>,
    /// Force every input into this category
    #[serde(default)]
    pub media_type: Option<Category>,
}

/// Bitmap subtitle conversion
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitleConfig {
    #[serde(default = "default_true")]
    pub convert_bitmap: bool,
    /// Tracks converted in parallel (0 = one per CPU core)
    #[serde(default)]
    pub max_workers: usize,
    /// Recognizer argv; `{input}` and `{lang}` are substituted per track
    #[serde(default)]
    pub recognizer_command: Option<Vec<String>>,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            convert_bitmap: true,
            max_workers: 0,
            recognizer_command: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Encoder selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Probe GPU encoders; off means libx265 only
    #[serde(default = "default_true")]
    pub allow_hardware: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            allow_hardware: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.transcode.mode, ModePreference::Transcode);
        assert_eq!(config.transcode.target_size_mb_per_hour, 900.0);
        assert_eq!(config.transcode.audio_bitrate_kbps, 192);
        assert!(config.transcode.output_dir.is_none());
        assert!(!config.transcode.overwrite);
        assert!(config.subtitles.convert_bitmap);
        assert!(config.encoders.allow_hardware);
        assert_eq!(config.converter.cpu_preset, "medium");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[transcode]
mode = "auto"
target_size_mb_per_hour = 1200
output_dir = "/media/out"
overwrite = true

[metadata]
filename_pattern = "<Movie Name> (<Year>)"
media_type = "tv_show"

[subtitles]
convert_bitmap = false
max_workers = 2
recognizer_command = ["pgs-ocr", "--lang", "{lang}", "{input}"]

[encoders]
allow_hardware = false

[converter]
cpu_preset = "slow"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.transcode.mode, ModePreference::Auto);
        assert_eq!(config.transcode.target_size_mb_per_hour, 1200.0);
        assert_eq!(config.transcode.output_dir, Some(PathBuf::from("/media/out")));
        assert_eq!(config.metadata.media_type, Some(Category::TvShow));
        assert!(!config.subtitles.convert_bitmap);
        assert_eq!(config.subtitles.recognizer_command.as_ref().map(Vec::len), Some(4));
        assert!(!config.encoders.allow_hardware);
        assert_eq!(config.converter.cpu_preset, "slow");
    }

    #[test]
    fn test_mode_preference_fixed() {
        assert_eq!(ModePreference::Rewrap.fixed(), Some(TranscodeMode::Rewrap));
        assert_eq!(ModePreference::Auto.fixed(), None);
    }

    #[test]
    fn test_unknown_mode_fails() {
        let result: Result<Config, _> = toml::from_str("[transcode]\nmode = \"fast\"");
        assert!(result.is_err());
    }
}
