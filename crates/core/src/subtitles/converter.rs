//! Bitmap to text subtitle conversion.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::RecognitionError;
use super::recognizer::{RecognitionRequest, TextRecognizer};
use super::srt::write_srt;
use super::types::GeneratedSubtitle;
use crate::cancel::CancelSignal;
use crate::converter::Transcoder;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::metrics;
use crate::streams::{
    normalize_language_tag, ConversionOutcome, SkipReason, SubtitleTrack, UNDETERMINED,
};

/// A track that was not converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSkip {
    pub reason: SkipReason,
    pub message: String,
}

impl TrackSkip {
    fn new(reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Result of converting every bitmap track of one input.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Input tracks in order, bitmap ones with their final outcome.
    pub tracks: Vec<SubtitleTrack>,
    /// Text files to mux, in track order.
    pub generated: Vec<GeneratedSubtitle>,
    pub diagnostics: Diagnostics,
}

impl ConversionReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SubtitleTrack> {
        self.tracks
            .iter()
            .filter(|t| matches!(t.outcome, Some(ConversionOutcome::Skipped(_))))
    }
}

/// Extracts bitmap subtitle streams and runs them through a recognizer.
///
/// Failures never propagate: a track that cannot be converted is marked
/// skipped and a diagnostic is recorded.
#[derive(Clone)]
pub struct SubtitleConverter {
    transcoder: Arc<dyn Transcoder>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
    enabled: bool,
    max_workers: usize,
}

impl SubtitleConverter {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Self {
        Self {
            transcoder,
            recognizer,
            enabled: true,
            max_workers: num_cpus::get(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Tracks converted at once. 0 means one per CPU core.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = if workers == 0 { num_cpus::get() } else { workers };
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Converts every bitmap track in `tracks`, writing intermediates and
    /// results into `work_dir`. Text tracks pass through untouched.
    ///
    /// When `cancel` fires, in-flight extractions and recognitions are
    /// dropped (which kills their processes) and every unfinished track is
    /// skipped as cancelled.
    pub async fn convert_tracks(
        &self,
        input: &Path,
        work_dir: &Path,
        tracks: &[SubtitleTrack],
        cancel: &CancelSignal,
    ) -> ConversionReport {
        let bitmap = bitmap_positions(tracks);
        if bitmap.is_empty() {
            return ConversionReport {
                tracks: tracks.to_vec(),
                ..Default::default()
            };
        }

        if self.enabled && self.recognizer.is_some() {
            if let Err(e) = tokio::fs::create_dir_all(work_dir).await {
                return self.skip_tracks(
                    tracks,
                    SkipReason::WriteFailed,
                    &format!("cannot create {}: {}", work_dir.display(), e),
                );
            }
        }

        let mut report = ConversionReport {
            tracks: tracks.to_vec(),
            ..Default::default()
        };
        let mut finished = vec![false; tracks.len()];
        let mut results = stream::iter(bitmap.iter().copied())
            .map(|i| async move { (i, self.convert(input, work_dir, &tracks[i]).await) })
            .buffered(self.max_workers.max(1));

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Subtitle conversion interrupted");
                    for &i in bitmap.iter().filter(|&&i| !finished[i]) {
                        self.record(
                            &mut report,
                            i,
                            Err(TrackSkip::new(SkipReason::Cancelled, "conversion interrupted")),
                        );
                    }
                    break;
                }
                next = results.next() => match next {
                    Some((i, result)) => {
                        finished[i] = true;
                        self.record(&mut report, i, result);
                    }
                    None => break,
                },
            }
        }
        report
    }

    /// Marks every bitmap track in `tracks` skipped for `reason` without
    /// touching the input.
    pub fn skip_tracks(
        &self,
        tracks: &[SubtitleTrack],
        reason: SkipReason,
        message: &str,
    ) -> ConversionReport {
        let mut report = ConversionReport {
            tracks: tracks.to_vec(),
            ..Default::default()
        };
        for i in bitmap_positions(tracks) {
            self.record(&mut report, i, Err(TrackSkip::new(reason, message)));
        }
        report
    }

    /// Converts one bitmap track into an SRT file.
    pub async fn convert(
        &self,
        input: &Path,
        work_dir: &Path,
        track: &SubtitleTrack,
    ) -> Result<GeneratedSubtitle, TrackSkip> {
        let index = track.stream.index;
        if !self.enabled {
            return Err(TrackSkip::new(
                SkipReason::Disabled,
                "bitmap subtitle conversion is disabled",
            ));
        }
        let Some(recognizer) = self.recognizer.as_ref() else {
            return Err(TrackSkip::new(
                SkipReason::NoRecognizer,
                "no text recognizer configured",
            ));
        };

        let image_path = work_dir.join(format!(
            "track_{}.{}",
            index,
            intermediate_extension(&track.stream.codec_name)
        ));
        self.transcoder
            .extract_subtitle(input, &track.stream, &image_path)
            .await
            .map_err(|e| TrackSkip::new(SkipReason::ExtractionFailed, e.to_string()))?;

        let request = RecognitionRequest {
            stream_index: index,
            image_path,
            codec_name: track.stream.codec_name.clone(),
            language_hint: track.language.clone(),
        };
        debug!(track = index, recognizer = recognizer.name(), "Recognizing subtitle track");
        let recognition = recognizer.recognize(&request).await.map_err(|e| match e {
            RecognitionError::NoText => TrackSkip::new(SkipReason::NoTextFound, e.to_string()),
            RecognitionError::Failed(_) => {
                TrackSkip::new(SkipReason::RecognitionFailed, e.to_string())
            }
        })?;
        if recognition.cues.is_empty() {
            return Err(TrackSkip::new(
                SkipReason::NoTextFound,
                "recognizer returned no cues",
            ));
        }

        let language = resolve_language(&track.language, recognition.language.as_deref());
        let path = srt_path(work_dir, index, &language);
        tokio::fs::write(&path, write_srt(&recognition.cues))
            .await
            .map_err(|e| {
                TrackSkip::new(
                    SkipReason::WriteFailed,
                    format!("cannot write {}: {}", path.display(), e),
                )
            })?;

        Ok(GeneratedSubtitle {
            source_index: index,
            path,
            language,
            cue_count: recognition.cues.len(),
        })
    }

    fn record(
        &self,
        report: &mut ConversionReport,
        position: usize,
        result: Result<GeneratedSubtitle, TrackSkip>,
    ) {
        let track = &mut report.tracks[position];
        match result {
            Ok(generated) => {
                info!(
                    track = track.stream.index,
                    language = %generated.language,
                    cues = generated.cue_count,
                    "Converted bitmap subtitle track"
                );
                metrics::SUBTITLE_CONVERSIONS
                    .with_label_values(&["converted"])
                    .inc();
                track.language = generated.language.clone();
                track.outcome = Some(ConversionOutcome::Converted);
                report.generated.push(generated);
            }
            Err(skip) => {
                metrics::SUBTITLE_CONVERSIONS
                    .with_label_values(&["skipped"])
                    .inc();
                if skip.reason.is_failure() {
                    report.diagnostics.emit(
                        DiagnosticKind::SubtitleConversionFailure,
                        format!(
                            "skipping subtitle track {} ({}): {}",
                            track.stream.index, track.language, skip.message
                        ),
                    );
                } else {
                    debug!(track = track.stream.index, "{}", skip.message);
                }
                track.outcome = Some(ConversionOutcome::Skipped(skip.reason));
            }
        }
    }
}

fn bitmap_positions(tracks: &[SubtitleTrack]) -> Vec<usize> {
    tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_bitmap())
        .map(|(i, _)| i)
        .collect()
}

/// Container tag wins when it is known; otherwise the detected language.
fn resolve_language(tagged: &str, detected: Option<&str>) -> String {
    if tagged != UNDETERMINED {
        return tagged.to_string();
    }
    detected
        .and_then(normalize_language_tag)
        .unwrap_or_else(|| UNDETERMINED.to_string())
}

fn intermediate_extension(codec_name: &str) -> &'static str {
    match codec_name.to_ascii_lowercase().as_str() {
        "hdmv_pgs_subtitle" | "pgssub" => "sup",
        _ => "mks",
    }
}

fn srt_path(work_dir: &Path, index: u32, language: &str) -> PathBuf {
    work_dir.join(format!("track_{}.{}.srt", index, language))
}
