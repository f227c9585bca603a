// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only. The job worker talks to the media
// engine exclusively through `BaseMediaExtractor` so tests can swap in a mock.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::AudioFormat;
use crate::kernel::error::ExtractionError;

// =============================================================================
// Media Extraction (Infrastructure - external fetch + transcode engine)
// =============================================================================

/// Everything the engine needs to fetch one URL and transcode its audio.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: String,
    pub format: AudioFormat,
    /// Free-form bitrate passed through to the transcoder (e.g. "192")
    pub quality: String,
    /// Scratch directory the engine writes into
    pub work_dir: PathBuf,
    pub socket_timeout: Duration,
    pub user_agent: String,
    /// Sent as `Referer` for sites that require it
    pub referer: Option<String>,
}

/// Progress notifications emitted while the engine runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineProgress {
    /// Transfer in progress; values are the engine's display strings
    Downloading {
        percent: String,
        speed: String,
        eta: String,
    },
    /// Transfer done, post-processing (transcoding) begins
    Finished,
}

/// What the engine reports after a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMedia {
    pub title: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    /// Path the engine reported for the produced media. The converted file
    /// shares its stem and carries the target format's extension.
    pub media_path: PathBuf,
}

#[async_trait]
pub trait BaseMediaExtractor: Send + Sync {
    /// Fetch and transcode `request.url`, reporting progress as it goes.
    async fn extract(
        &self,
        request: &ExtractionRequest,
        on_progress: &(dyn Fn(EngineProgress) + Send + Sync),
    ) -> Result<ExtractedMedia, ExtractionError>;
}
