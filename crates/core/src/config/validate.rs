use super::{types::Config, ConfigError};
use crate::metadata::FilenameTemplate;

/// Validate configuration
/// Currently validates:
/// - Target size is a positive number
/// - Audio bitrate is not 0
/// - The filename pattern compiles
/// - The recognizer command names a program
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let target = config.transcode.target_size_mb_per_hour;
    if !target.is_finite() || target <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "transcode.target_size_mb_per_hour must be positive, got {}",
            target
        )));
    }

    if config.transcode.audio_bitrate_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "transcode.audio_bitrate_kbps cannot be 0".to_string(),
        ));
    }

    if let Some(ref pattern) = config.metadata.filename_pattern {
        FilenameTemplate::compile(pattern)
            .map_err(|e| ConfigError::ValidationError(format!("metadata.filename_pattern: {}", e)))?;
    }

    if let Some(ref argv) = config.subtitles.recognizer_command {
        if argv.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "subtitles.recognizer_command cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
