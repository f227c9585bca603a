//! In-memory job registry.
//!
//! The registry maps job ids to their current [`JobRecord`] and is the single
//! source of truth for status polling. It is constructed once by the
//! application root and shared by handle (`Arc<JobRegistry>`) with request
//! handlers and workers.
//!
//! Every mutation replaces a whole record under the write lock, so readers
//! see either the old or the new record and never a mixture. Status
//! transitions are validated here: backward moves and writes to terminal
//! records are rejected.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use super::job::{JobRecord, JobStatus, JobUpdate};
use crate::common::JobId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobRegistryError {
    #[error("job {0} already exists")]
    DuplicateJob(JobId),

    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {id} is already {status:?}")]
    JobTerminal { id: JobId, status: JobStatus },

    #[error("job {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Per-status record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub total: usize,
    pub by_status: HashMap<JobStatus, usize>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new record in `queued` state.
    pub fn create(&self, id: JobId) -> Result<JobRecord, JobRegistryError> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        if jobs.contains_key(&id) {
            return Err(JobRegistryError::DuplicateJob(id));
        }
        let record = JobRecord::queued(id);
        jobs.insert(id, record.clone());
        Ok(record)
    }

    /// Replace the observable state of a job.
    ///
    /// The platform label is kept from the previous record unless the
    /// update carries a new one.
    pub fn update(
        &self,
        id: &JobId,
        update: impl Into<JobUpdate>,
    ) -> Result<JobRecord, JobRegistryError> {
        let update = update.into();
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let current = jobs.get(id).ok_or(JobRegistryError::NotFound(*id))?;

        let from = current.status();
        let to = update.state.status();
        if from.is_terminal() {
            return Err(JobRegistryError::JobTerminal {
                id: *id,
                status: from,
            });
        }
        if !from.can_transition_to(to) {
            return Err(JobRegistryError::InvalidTransition { id: *id, from, to });
        }

        let next = JobRecord {
            id: *id,
            platform: update.platform.or_else(|| current.platform.clone()),
            state: update.state,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };
        jobs.insert(*id, next.clone());
        Ok(next)
    }

    /// Snapshot of a job's current record.
    pub fn get(&self, id: &JobId) -> Result<JobRecord, JobRegistryError> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or(JobRegistryError::NotFound(*id))
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        let mut counts = JobCounts {
            total: jobs.len(),
            by_status: HashMap::new(),
        };
        for record in jobs.values() {
            *counts.by_status.entry(record.status()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop terminal records whose last update is older than `retention`.
    ///
    /// Live jobs are never evicted. Returns the number of removed records.
    pub fn evict_terminal_older_than(&self, retention: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(retention) {
            Ok(retention) => Utc::now() - retention,
            Err(_) => return 0,
        };
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|_, record| !(record.is_terminal() && record.updated_at <= cutoff));
        before - jobs.len()
    }
}
