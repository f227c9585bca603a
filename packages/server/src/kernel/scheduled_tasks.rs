//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Currently a single task: evicting finished job records once they are
//! older than the configured retention. Without a retention the registry
//! keeps every record for the life of the process.
//!
//! ```text
//! Scheduler (every minute)
//!     │
//!     └─► JobRegistry.evict_terminal_older_than(retention)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::kernel::jobs::JobRegistry;

/// Start all scheduled tasks
pub async fn start_scheduler(registry: Arc<JobRegistry>, retention: Duration) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let registry = registry.clone();
        Box::pin(async move {
            run_retention_sweep(&registry, retention);
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(
        retention_secs = retention.as_secs(),
        "Scheduled tasks started (job retention sweep every minute)"
    );

    Ok(scheduler)
}

/// Evict terminal jobs older than `retention`. Returns how many were removed.
pub fn run_retention_sweep(registry: &JobRegistry, retention: Duration) -> usize {
    let evicted = registry.evict_terminal_older_than(retention);
    if evicted > 0 {
        tracing::info!(evicted, remaining = registry.len(), "Evicted finished jobs");
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::jobs::JobState;

    #[test]
    fn test_sweep_removes_finished_jobs_past_retention() {
        let registry = JobRegistry::new();
        let finished = JobId::new();
        let running = JobId::new();
        registry.create(finished).unwrap();
        registry.create(running).unwrap();
        registry.update(&finished, JobState::error("gone")).unwrap();

        assert_eq!(run_retention_sweep(&registry, Duration::ZERO), 1);
        assert!(registry.contains(&running));
        assert_eq!(registry.len(), 1);
    }
}
