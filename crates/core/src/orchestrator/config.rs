//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{Config, ModePreference};

/// The per-batch settings the orchestrator needs from [`Config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub mode: ModePreference,
    pub target_size_mb_per_hour: f64,
    pub audio_bitrate_kbps: u32,
    /// Output directory; `None` writes next to each input.
    pub output_dir: Option<PathBuf>,
    pub overwrite: bool,
    /// Parent of the per-job scratch directories.
    pub work_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.transcode.mode,
            target_size_mb_per_hour: config.transcode.target_size_mb_per_hour,
            audio_bitrate_kbps: config.transcode.audio_bitrate_kbps,
            output_dir: config.transcode.output_dir.clone(),
            overwrite: config.transcode.overwrite,
            work_dir: config.converter.temp_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.mode, ModePreference::Transcode);
        assert_eq!(config.target_size_mb_per_hour, 900.0);
        assert_eq!(config.audio_bitrate_kbps, 192);
        assert!(config.output_dir.is_none());
        assert!(!config.overwrite);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.transcode.mode = ModePreference::Auto;
        config.transcode.output_dir = Some(PathBuf::from("/media/out"));
        config.converter.temp_dir = PathBuf::from("/scratch");

        let orchestrator = OrchestratorConfig::from(&config);
        assert_eq!(orchestrator.mode, ModePreference::Auto);
        assert_eq!(orchestrator.output_dir, Some(PathBuf::from("/media/out")));
        assert_eq!(orchestrator.work_dir, PathBuf::from("/scratch"));
    }
}
