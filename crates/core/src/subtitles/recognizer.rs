//! Text recognition for bitmap subtitles.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::RecognitionError;
use super::srt::parse_srt;
use super::types::Cue;
use crate::streams::normalize_language_tag;

/// Input to a recognizer: one extracted bitmap subtitle stream.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub stream_index: u32,
    /// Extracted image subtitle file (`.sup` or `.mks`).
    pub image_path: PathBuf,
    pub codec_name: String,
    /// Language tag from the source container, `und` when unknown.
    pub language_hint: String,
}

/// Recognized cues plus the detected language, if the engine reports one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub cues: Vec<Cue>,
    pub language: Option<String>,
}

/// Turns an image subtitle stream into timed text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Fails with [`RecognitionError::NoText`] when the engine ran cleanly
    /// but found nothing, and [`RecognitionError::Failed`] otherwise.
    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError>;
}

/// Runs an external program per track.
///
/// The argv template may contain `{input}` (the extracted image file) and
/// `{lang}` (the language hint). The program writes SRT to stdout and may
/// report the detected language as a `language=<code>` line on stderr.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    argv: Vec<String>,
}

impl CommandRecognizer {
    /// `None` for an empty template.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.first().map_or(true, |program| program.trim().is_empty()) {
            return None;
        }
        Some(Self { argv })
    }

    /// Argument list with placeholders filled in.
    pub fn render_args(&self, request: &RecognitionRequest) -> Vec<String> {
        let input = request.image_path.to_string_lossy();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{lang}", &request.language_hint)
            })
            .collect()
    }
}

#[async_trait]
impl TextRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.argv[0]
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError> {
        let args = self.render_args(request);
        let Some((program, rest)) = args.split_first() else {
            return Err(RecognitionError::Failed("empty recognizer command".to_string()));
        };
        debug!(program = %program, input = %request.image_path.display(), "Running recognizer");

        let output = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RecognitionError::Failed(format!("failed to start {}: {}", program, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let tail = stderr.lines().last().unwrap_or_default().trim().to_string();
            return Err(RecognitionError::Failed(format!(
                "{} exited with {}: {}",
                program, output.status, tail
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let cues = parse_srt(&stdout).map_err(|e| RecognitionError::Failed(e.to_string()))?;
        if cues.is_empty() {
            return Err(RecognitionError::NoText);
        }

        Ok(Recognition {
            cues,
            language: detected_language(&stderr),
        })
    }
}

/// Last `language=<code>` line in the recognizer's diagnostics.
fn detected_language(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .filter_map(|line| line.trim().strip_prefix("language="))
        .filter_map(normalize_language_tag)
        .last()
}
