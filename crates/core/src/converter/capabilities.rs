//! Hardware encoder capability detection.
//!
//! Each hardware encoder is tried once with a tiny synthetic encode. Results
//! are memoized for the life of the prober, so a run probes each encoder at
//! most once no matter how many jobs ask.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::encoder::{Availability, EncoderCandidate, EncoderKind};
use super::traits::Transcoder;

/// Probed encoders in priority order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityTable {
    candidates: Vec<EncoderCandidate>,
}

impl CapabilityTable {
    pub fn new(candidates: Vec<EncoderCandidate>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[EncoderCandidate] {
        &self.candidates
    }

    pub fn available(&self) -> impl Iterator<Item = &EncoderCandidate> {
        self.candidates.iter().filter(|c| c.is_available())
    }

    /// Highest-priority working encoder.
    pub fn first_available(&self) -> Option<EncoderCandidate> {
        self.available().next().copied()
    }

    /// The next working encoder ranked below `kind`.
    pub fn next_available_after(&self, kind: EncoderKind) -> Option<EncoderCandidate> {
        let rank = self.candidates.iter().find(|c| c.kind == kind)?.rank;
        self.available().find(|c| c.rank > rank).copied()
    }

    pub fn availability(&self, kind: EncoderKind) -> Availability {
        self.candidates
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.availability)
            .unwrap_or_default()
    }
}

/// Determines which encoders work on this machine.
pub struct CapabilityProber {
    transcoder: Arc<dyn Transcoder>,
    priority: Vec<EncoderKind>,
    cache: Mutex<HashMap<EncoderKind, Availability>>,
}

impl CapabilityProber {
    /// Uses the platform priority order. With `allow_hardware` off only the
    /// CPU encoder is considered.
    pub fn new(transcoder: Arc<dyn Transcoder>, allow_hardware: bool) -> Self {
        let priority = EncoderKind::platform_priority()
            .iter()
            .copied()
            .filter(|kind| allow_hardware || !kind.is_hardware())
            .collect();
        Self::with_priority(transcoder, priority)
    }

    /// Uses an explicit priority order.
    pub fn with_priority(transcoder: Arc<dyn Transcoder>, priority: Vec<EncoderKind>) -> Self {
        Self {
            transcoder,
            priority,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn priority(&self) -> &[EncoderKind] {
        &self.priority
    }

    /// Probes every candidate not probed before and returns the table.
    ///
    /// The CPU encoder is marked available without a trial.
    pub async fn probe(&self) -> CapabilityTable {
        let mut cache = self.cache.lock().await;
        let mut candidates = Vec::with_capacity(self.priority.len());

        for (rank, kind) in self.priority.iter().copied().enumerate() {
            let availability = match cache.get(&kind) {
                Some(known) => *known,
                None => {
                    let result = self.trial(kind).await;
                    cache.insert(kind, result);
                    result
                }
            };
            candidates.push(EncoderCandidate {
                kind,
                rank,
                availability,
            });
        }

        CapabilityTable::new(candidates)
    }

    async fn trial(&self, kind: EncoderKind) -> Availability {
        if !kind.is_hardware() {
            return Availability::Available;
        }

        match self.transcoder.trial_encode(kind).await {
            Ok(()) => {
                info!(encoder = %kind, vendor = kind.vendor(), "Hardware encoder available");
                Availability::Available
            }
            Err(e) => {
                debug!(encoder = %kind, error = %e, "Hardware encoder unavailable");
                Availability::Unavailable
            }
        }
    }
}
