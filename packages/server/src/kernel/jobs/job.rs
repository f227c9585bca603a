//! Job record model for download/conversion jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{AudioFormat, JobId};

/// Platform label recorded on failures that happen before classification.
pub const UNKNOWN_PLATFORM: &str = "unknown";

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Starting,
    Downloading,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn all() -> &'static [JobStatus] {
        &[
            JobStatus::Queued,
            JobStatus::Starting,
            JobStatus::Downloading,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Error,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Position along `queued → starting → downloading → processing → completed`.
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Starting => 1,
            JobStatus::Downloading => 2,
            JobStatus::Processing => 3,
            JobStatus::Completed | JobStatus::Error => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether a record in `self` may move to `next`.
    ///
    /// Transitions only move forward. `downloading` may repeat (one update
    /// per progress frame) and `error` is reachable from any live status.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Error => true,
            JobStatus::Downloading if *self == JobStatus::Downloading => true,
            _ => next.rank() > self.rank(),
        }
    }
}

// ============================================================================
// State payloads
// ============================================================================

/// Observable per-status fields of a job.
///
/// Serialized with the status as the `status` tag so a record flattens to
/// `{"status": "downloading", "percent": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Starting {
        message: String,
    },
    Downloading {
        percent: String,
        speed: String,
        eta: String,
    },
    Processing {
        message: String,
    },
    Completed {
        filename: String,
        title: String,
        duration: f64,
        format: AudioFormat,
    },
    Error {
        error: String,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued => JobStatus::Queued,
            JobState::Starting { .. } => JobStatus::Starting,
            JobState::Downloading { .. } => JobStatus::Downloading,
            JobState::Processing { .. } => JobStatus::Processing,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Error { .. } => JobStatus::Error,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        JobState::Error {
            error: message.into(),
        }
    }
}

/// A state change plus an optional platform label to record with it.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    pub state: JobState,
    pub platform: Option<String>,
}

impl JobUpdate {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

impl From<JobState> for JobUpdate {
    fn from(state: JobState) -> Self {
        Self::new(state)
    }
}

// ============================================================================
// Record
// ============================================================================

/// One tracked job, as returned verbatim by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(flatten)]
    pub state: JobState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// A freshly accepted job.
    pub fn queued(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            platform: None,
            state: JobState::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}
