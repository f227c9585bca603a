//! Extraction worker: runs one download job to a terminal state.
//!
//! # Protocol
//!
//! ```text
//! queued
//!   └─► starting      classify URL, record platform
//!         ├─► error   platform requires authentication (engine never called)
//!         └─► downloading*  engine progress frames
//!               └─► processing  engine finished transfer, transcoding
//!                     └─► completed  artifact moved to the output directory
//! ```
//!
//! The engine writes into a scratch directory private to the job
//! (`<work_dir>/<job id>/`), so jobs producing identically named files
//! never touch each other's output.
//!
//! Any failure along the way becomes a terminal `error` record. Nothing
//! escapes to the caller: `run` returns `()`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::job::{JobState, JobUpdate, UNKNOWN_PLATFORM};
use super::registry::{JobRegistry, JobRegistryError};
use crate::common::{classify, AudioFormat, JobId, Platform};
use crate::kernel::error::ExtractionError;
use crate::kernel::traits::{BaseMediaExtractor, EngineProgress, ExtractionRequest};

/// Browser-like client identification; some sites refuse the engine's default.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Filesystem and network settings shared by all workers.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Scratch area the engine writes into
    pub work_dir: PathBuf,
    /// Public area completed artifacts are moved to
    pub output_dir: PathBuf,
    pub socket_timeout: Duration,
    pub user_agent: String,
}

impl WorkerSettings {
    pub fn new(work_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            output_dir: output_dir.into(),
            socket_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }
}

/// One accepted download request.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: JobId,
    pub url: String,
    pub format: AudioFormat,
    pub quality: String,
}

#[derive(Debug, Error)]
enum WorkerError {
    #[error("{} requires authentication. Please use another source.", .0.display_name())]
    UnsupportedPlatform(Platform),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Registry(#[from] JobRegistryError),
}

#[derive(Clone)]
pub struct ExtractionWorker {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn BaseMediaExtractor>,
    settings: Arc<WorkerSettings>,
}

impl ExtractionWorker {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn BaseMediaExtractor>,
        settings: Arc<WorkerSettings>,
    ) -> Self {
        Self {
            registry,
            extractor,
            settings,
        }
    }

    /// Run the job to a terminal state.
    pub async fn run(&self, job: DownloadJob) {
        let mut platform = None;
        match self.execute(&job, &mut platform).await {
            Ok(()) => {}
            Err(e) => {
                let label = platform
                    .map(|p: Platform| p.to_string())
                    .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());
                warn!(job_id = %job.id, platform = %label, error = %e, "download failed");
                self.fail(&job.id, e.to_string(), label);
            }
        }
    }

    async fn execute(
        &self,
        job: &DownloadJob,
        platform_out: &mut Option<Platform>,
    ) -> Result<(), WorkerError> {
        let platform = classify(&job.url);
        *platform_out = Some(platform);

        self.registry.update(
            &job.id,
            JobUpdate::new(JobState::Starting {
                message: format!("Initializing ({})...", platform),
            })
            .with_platform(platform.as_str()),
        )?;
        info!(job_id = %job.id, platform = %platform, format = %job.format, "job starting");

        if platform.requires_authentication() {
            return Err(WorkerError::UnsupportedPlatform(platform));
        }

        let scratch = ScratchDir::create(&self.settings.work_dir, &job.id)
            .await
            .map_err(ExtractionError::from)?;

        let request = ExtractionRequest {
            url: job.url.clone(),
            format: job.format,
            quality: job.quality.clone(),
            work_dir: scratch.path().to_path_buf(),
            socket_timeout: self.settings.socket_timeout,
            user_agent: self.settings.user_agent.clone(),
            referer: platform.needs_referer().then(|| job.url.clone()),
        };

        let registry = &self.registry;
        let job_id = job.id;
        let processing_message = format!("Converting to {}...", job.format.codec().to_uppercase());
        let on_progress = move |event: EngineProgress| {
            let state = match event {
                EngineProgress::Downloading {
                    percent,
                    speed,
                    eta,
                } => JobState::Downloading {
                    percent,
                    speed,
                    eta,
                },
                EngineProgress::Finished => JobState::Processing {
                    message: processing_message.clone(),
                },
            };
            if let Err(e) = registry.update(&job_id, state) {
                debug!(job_id = %job_id, error = %e, "dropping progress update");
            }
        };

        let media = self.extractor.extract(&request, &on_progress).await?;

        let produced = media.media_path.with_extension(job.format.extension());
        if !tokio::fs::try_exists(&produced).await.unwrap_or(false) {
            return Err(ExtractionError::OutputMissing {
                format: job.format.codec().to_string(),
                path: produced,
            }
            .into());
        }

        let filename = produced
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ExtractionError::OutputMissing {
                format: job.format.codec().to_string(),
                path: produced.clone(),
            })?;
        let destination = self.settings.output_dir.join(&filename);
        move_file(&produced, &destination)
            .await
            .map_err(ExtractionError::from)?;

        self.registry.update(
            &job.id,
            JobState::Completed {
                filename: filename.clone(),
                title: media.title.unwrap_or_else(|| "Unknown".to_string()),
                duration: media.duration.unwrap_or(0.0),
                format: job.format,
            },
        )?;
        info!(job_id = %job.id, filename = %filename, "job completed");
        Ok(())
    }

    fn fail(&self, id: &JobId, message: String, platform: String) {
        let update = JobUpdate::new(JobState::error(message)).with_platform(platform);
        if let Err(e) = self.registry.update(id, update) {
            error!(job_id = %id, error = %e, "failed to record job error");
        }
    }
}

/// Per-job scratch directory under the shared work dir, removed on drop.
///
/// Removal happens on every exit path, including a panicking extractor
/// unwinding through the worker.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    async fn create(work_dir: &Path, id: &JobId) -> std::io::Result<Self> {
        let path = work_dir.join(id.to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch dir");
            }
        }
    }
}

/// Rename `from` to `to`, copying across filesystems when rename cannot.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "rename failed, falling back to copy");
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}
