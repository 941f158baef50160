//! Picks the streams carried into the output and classifies subtitles.

use thiserror::Error;

use super::language::language_or_undetermined;
use super::types::{ConversionOutcome, StreamSelection, SubtitleKind, SubtitleTrack};
use crate::converter::{StreamDescriptor, StreamKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Errors from stream classification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("input has no video stream")]
    NoVideoStream,
}

/// Selects one video stream, one primary audio stream and every subtitle
/// stream with a known codec family.
///
/// Video is the first by index, skipping embedded cover art. Audio is the
/// first stream flagged default, else the first by index. Subtitle streams
/// with unknown codecs are dropped with a diagnostic.
pub fn classify(
    streams: &[StreamDescriptor],
    diagnostics: &mut Diagnostics,
) -> Result<StreamSelection, ClassifyError> {
    let mut ordered: Vec<&StreamDescriptor> = streams.iter().collect();
    ordered.sort_by_key(|s| s.index);

    let video = ordered
        .iter()
        .find(|s| s.kind == StreamKind::Video && !s.disposition.attached_pic)
        .map(|s| (*s).clone())
        .ok_or(ClassifyError::NoVideoStream)?;

    let audio_streams: Vec<&&StreamDescriptor> = ordered
        .iter()
        .filter(|s| s.kind == StreamKind::Audio)
        .collect();
    let audio = audio_streams
        .iter()
        .find(|s| s.disposition.default)
        .or_else(|| audio_streams.first())
        .map(|s| (**s).clone());

    let mut subtitles = Vec::new();
    for stream in ordered.iter().filter(|s| s.kind == StreamKind::Subtitle) {
        let Some(kind) = SubtitleKind::from_codec(&stream.codec_name) else {
            diagnostics.emit(
                DiagnosticKind::UnrecognizedSubtitleCodec,
                format!(
                    "dropping subtitle stream {} with unsupported codec '{}'",
                    stream.index, stream.codec_name
                ),
            );
            continue;
        };

        subtitles.push(SubtitleTrack {
            stream: (*stream).clone(),
            kind,
            language: language_or_undetermined(stream.language.as_deref()),
            outcome: (kind == SubtitleKind::Bitmap).then_some(ConversionOutcome::Pending),
        });
    }

    Ok(StreamSelection {
        video,
        audio,
        subtitles,
    })
}
