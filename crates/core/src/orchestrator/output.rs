//! Input discovery and output naming.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::OrchestratorError;

/// Container extensions picked up when a source is a directory.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "m4v", "avi", "mov", "wmv", "flv", "webm", "ts", "m2ts", "mts", "mpg", "mpeg",
];

/// Extension of every output file.
pub const OUTPUT_EXTENSION: &str = "mp4";

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expands sources into the list of input files.
///
/// Files are taken as given. Directories contribute their video files,
/// sorted by name, without descending into subdirectories.
pub async fn discover_inputs(sources: &[PathBuf]) -> Result<Vec<PathBuf>, OrchestratorError> {
    let mut inputs = Vec::new();

    for source in sources {
        let meta = tokio::fs::metadata(source)
            .await
            .map_err(|_| OrchestratorError::InputNotFound(source.clone()))?;

        if !meta.is_dir() {
            inputs.push(source.clone());
            continue;
        }

        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(source).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_video_file(&path) {
                found.push(path);
            }
        }
        found.sort();
        debug!(dir = %source.display(), count = found.len(), "Discovered inputs");
        inputs.extend(found);
    }

    if inputs.is_empty() {
        return Err(OrchestratorError::NoInputs);
    }
    Ok(inputs)
}

/// Picks `<dir>/<stem>.mp4`, where `dir` is `output_dir` or the input's own
/// directory.
///
/// A name already taken (unless `overwrite`) or equal to the input gets a
/// `_1`, `_2`, ... suffix.
pub fn resolve_output_path(input: &Path, output_dir: Option<&Path>, overwrite: bool) -> PathBuf {
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let usable = |candidate: &Path| candidate != input && (overwrite || !candidate.exists());

    let candidate = dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION));
    if usable(&candidate) {
        return candidate;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, n, OUTPUT_EXTENSION));
        if usable(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
