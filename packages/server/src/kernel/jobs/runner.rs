//! Job runner: managed launching of extraction workers.
//!
//! Every accepted job gets its own tokio task. The runner:
//! - launches workers fire-and-forget (callers never await them)
//! - optionally bounds how many workers run at once; jobs waiting for a
//!   slot stay `queued`
//! - converts a panicking worker into a terminal `error` record
//! - tracks running tasks so shutdown can wait for them, and refuses new
//!   ones once shutdown has begun
//!
//! # Architecture
//!
//! ```text
//! POST /download
//!     │
//!     └─► JobRunner::spawn(job_id, worker.run(job))
//!             ├─► wait for a permit (if bounded)
//!             ├─► run worker (catch_unwind)
//!             └─► on panic: registry.update(job_id, error)
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use super::job::{JobState, JobUpdate, UNKNOWN_PLATFORM};
use super::registry::JobRegistry;
use crate::common::JobId;

const SHUTTING_DOWN: &str = "Server is shutting down";

/// Configuration for the job runner.
#[derive(Debug, Clone, Default)]
pub struct JobRunnerConfig {
    /// Maximum workers running at once. `None` means unbounded.
    pub max_concurrent_jobs: Option<usize>,
}

pub struct JobRunner {
    registry: Arc<JobRegistry>,
    tracker: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self::with_config(registry, JobRunnerConfig::default())
    }

    pub fn with_config(registry: Arc<JobRegistry>, config: JobRunnerConfig) -> Self {
        let limiter = config
            .max_concurrent_jobs
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        Self {
            registry,
            tracker: TaskTracker::new(),
            limiter,
        }
    }

    /// Launch `work` for `job_id` in the background.
    ///
    /// Once [`shutdown`](Self::shutdown) has begun, `work` is dropped
    /// unrun, the job is recorded as an error and `false` is returned.
    pub fn spawn<F>(&self, job_id: JobId, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tracker.is_closed() {
            warn!(job_id = %job_id, "runner is shutting down, rejecting job");
            record_failure(&self.registry, &job_id, SHUTTING_DOWN.to_string());
            return false;
        }

        let registry = self.registry.clone();
        let limiter = self.limiter.clone();

        self.tracker.spawn(async move {
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };

            if let Err(panic) = AssertUnwindSafe(work).catch_unwind().await {
                let message = panic_message(panic.as_ref());
                error!(job_id = %job_id, panic = %message, "worker panicked");
                record_failure(&registry, &job_id, format!("Internal error: {}", message));
            }
        });
        true
    }

    /// Number of workers currently tracked (running or waiting for a slot).
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait for running workers.
    ///
    /// Returns `true` if every worker finished within `grace`.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let active = self.tracker.len();
        if active > 0 {
            info!(count = active, "waiting for running jobs to complete");
        }
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    count = self.tracker.len(),
                    "shutdown grace period elapsed with jobs still running"
                );
                false
            }
        }
    }
}

fn record_failure(registry: &JobRegistry, job_id: &JobId, message: String) {
    let platform = registry
        .get(job_id)
        .ok()
        .and_then(|record| record.platform)
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());
    let update = JobUpdate::new(JobState::error(message)).with_platform(platform);
    if let Err(e) = registry.update(job_id, update) {
        error!(job_id = %job_id, error = %e, "failed to record job failure");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
