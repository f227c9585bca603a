// TestDependencies - mock implementations for testing
//
// Provides a scripted media extractor that can be injected into ServerDeps
// in place of the real yt-dlp driver.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::error::ExtractionError;
use super::traits::{BaseMediaExtractor, EngineProgress, ExtractedMedia, ExtractionRequest};

// =============================================================================
// Mock Media Extractor
// =============================================================================

/// What the mock does once its progress script has been replayed.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Write `<title>.<ext>` into the work dir and report success
    Produce { title: String, duration: f64 },
    /// Report success without writing any file
    ProduceWithoutFile { title: String },
    /// Report an engine failure with this message
    Fail(String),
    /// Panic inside the extractor
    Panic(String),
}

pub struct MockExtractor {
    progress: Vec<EngineProgress>,
    outcome: MockOutcome,
    delay: Option<Duration>,
    calls: Mutex<Vec<ExtractionRequest>>,
}

impl MockExtractor {
    /// Produces "Test Track" after a short progress script.
    pub fn new() -> Self {
        Self::producing("Test Track", 180.0)
    }

    pub fn producing(title: &str, duration: f64) -> Self {
        Self::with_outcome(MockOutcome::Produce {
            title: title.to_string(),
            duration,
        })
    }

    pub fn without_output(title: &str) -> Self {
        Self::with_outcome(MockOutcome::ProduceWithoutFile {
            title: title.to_string(),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(MockOutcome::Fail(message.to_string()))
    }

    pub fn panicking(message: &str) -> Self {
        Self::with_outcome(MockOutcome::Panic(message.to_string()))
    }

    pub fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            progress: default_progress(),
            outcome,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the progress events replayed before the outcome.
    pub fn with_progress(mut self, progress: Vec<EngineProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Sleep this long after the first progress event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in call order.
    pub fn calls(&self) -> Vec<ExtractionRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn default_progress() -> Vec<EngineProgress> {
    vec![
        EngineProgress::Downloading {
            percent: "50.0%".to_string(),
            speed: "1.00MiB/s".to_string(),
            eta: "00:02".to_string(),
        },
        EngineProgress::Downloading {
            percent: "100.0%".to_string(),
            speed: "1.00MiB/s".to_string(),
            eta: "00:00".to_string(),
        },
        EngineProgress::Finished,
    ]
}

#[async_trait]
impl BaseMediaExtractor for MockExtractor {
    async fn extract(
        &self,
        request: &ExtractionRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<ExtractedMedia, ExtractionError> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(request.clone());

        for (i, event) in self.progress.iter().enumerate() {
            on_progress(event.clone());
            if i == 0 {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        match &self.outcome {
            MockOutcome::Produce { title, duration } => {
                let converted = request
                    .work_dir
                    .join(format!("{}.{}", title, request.format.extension()));
                tokio::fs::write(&converted, b"mock audio").await?;
                Ok(ExtractedMedia {
                    title: Some(title.clone()),
                    duration: Some(*duration),
                    media_path: request.work_dir.join(format!("{}.webm", title)),
                })
            }
            MockOutcome::ProduceWithoutFile { title } => Ok(ExtractedMedia {
                title: Some(title.clone()),
                duration: None,
                media_path: request.work_dir.join(format!("{}.webm", title)),
            }),
            MockOutcome::Fail(message) => Err(ExtractionError::EngineFailed(message.clone())),
            MockOutcome::Panic(message) => panic!("{}", message),
        }
    }
}
