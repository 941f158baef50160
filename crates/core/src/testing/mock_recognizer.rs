//! Mock text recognizer for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::subtitles::{Cue, Recognition, RecognitionError, RecognitionRequest, TextRecognizer};

/// Mock implementation of the TextRecognizer trait.
///
/// Returns one cue with no detected language unless configured otherwise.
/// Results can be set per source stream index.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    default: Arc<RwLock<Result<Recognition, RecognitionError>>>,
    results: Arc<RwLock<HashMap<u32, Result<Recognition, RecognitionError>>>>,
    requests: Arc<RwLock<Vec<RecognitionRequest>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockRecognizer {
    fn default() -> Self {
        let recognition = Recognition {
            cues: vec![Cue::new(
                Duration::from_secs(1),
                Duration::from_secs(3),
                "Mock line",
            )],
            language: None,
        };
        Self {
            default: Arc::new(RwLock::new(Ok(recognition))),
            results: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result for every stream without a specific one.
    pub async fn set_default(&self, result: Result<Recognition, RecognitionError>) {
        *self.default.write().await = result;
    }

    /// Result for one source stream.
    pub async fn set_result(&self, stream_index: u32, result: Result<Recognition, RecognitionError>) {
        self.results.write().await.insert(stream_index, result);
    }

    /// Make every recognition take `delay`, like a slow OCR engine.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<RecognitionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognition, RecognitionError> {
        self.requests.write().await.push(request.clone());
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(result) = self.results.read().await.get(&request.stream_index) {
            return result.clone();
        }
        self.default.read().await.clone()
    }
}
