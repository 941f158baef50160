//! Non-fatal events recorded while processing a single input file.
//!
//! Anything the operator should know about but that does not fail the job
//! (metadata fallback, dropped subtitle codecs, skipped tracks, encoder
//! fallbacks) is emitted here. Each event is logged at `warn` and kept on the
//! job report.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What kind of event was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No filename pattern matched; fallback metadata was used.
    PatternMatchFailure,
    /// A subtitle stream had a codec outside both known families.
    UnrecognizedSubtitleCodec,
    /// A bitmap subtitle track could not be converted and was skipped.
    SubtitleConversionFailure,
    /// The planned bitrate fell below the quality floor.
    BitrateFloorApplied,
    /// An encoder failed and the next candidate was tried.
    EncoderFallback,
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Ordered collection of diagnostics for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record an event.
    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = ?kind, "{}", message);
        self.events.push(Diagnostic { kind, message });
    }

    /// Move all events from `other` into this collection.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
