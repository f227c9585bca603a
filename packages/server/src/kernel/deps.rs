//! Server dependencies shared by request handlers and background tasks.
//!
//! This is the one place the job registry, runner, and media extractor are
//! wired together. It is built by the application root and handed to the
//! router as shared state; there is no global job map.

use std::sync::Arc;

use tracing::info;

use super::jobs::{
    DownloadJob, ExtractionWorker, JobRegistry, JobRegistryError, JobRunner, WorkerSettings,
};
use super::traits::BaseMediaExtractor;
use crate::common::{AudioFormat, JobId};

#[derive(Clone)]
pub struct ServerDeps {
    pub registry: Arc<JobRegistry>,
    pub runner: Arc<JobRunner>,
    pub extractor: Arc<dyn BaseMediaExtractor>,
    pub settings: Arc<WorkerSettings>,
}

impl ServerDeps {
    pub fn new(
        registry: Arc<JobRegistry>,
        runner: Arc<JobRunner>,
        extractor: Arc<dyn BaseMediaExtractor>,
        settings: Arc<WorkerSettings>,
    ) -> Self {
        Self {
            registry,
            runner,
            extractor,
            settings,
        }
    }

    pub fn worker(&self) -> ExtractionWorker {
        ExtractionWorker::new(
            self.registry.clone(),
            self.extractor.clone(),
            self.settings.clone(),
        )
    }

    /// Accept a validated download: allocate an id, record it as `queued`,
    /// and launch its worker without waiting for it.
    pub fn submit_download(
        &self,
        url: String,
        format: AudioFormat,
        quality: String,
    ) -> Result<JobId, JobRegistryError> {
        let id = JobId::new();
        self.registry.create(id)?;

        let job = DownloadJob {
            id,
            url,
            format,
            quality,
        };
        info!(job_id = %id, url = %job.url, format = %format, "download queued");

        let worker = self.worker();
        self.runner.spawn(id, async move { worker.run(job).await });
        Ok(id)
    }
}
