//! Job infrastructure for asynchronous download/conversion jobs.
//!
//! - [`JobRegistry`] - in-memory map of job id to current [`JobRecord`]
//! - [`ExtractionWorker`] - runs one job, feeding engine progress into the registry
//! - [`JobRunner`] - launches workers as tracked background tasks
//!
//! # Architecture
//!
//! ```text
//! POST /download
//!     │
//!     ├─► JobRegistry.create(id)            (queued)
//!     └─► JobRunner.spawn(worker.run(job))
//!             └─► ExtractionWorker
//!                     ├─► JobRegistry.update (starting, downloading*, processing)
//!                     ├─► BaseMediaExtractor.extract
//!                     └─► JobRegistry.update (completed | error)
//!
//! GET /status/:id ─► JobRegistry.get(id)
//! ```

mod job;
mod registry;
mod runner;
mod worker;

pub use job::{JobRecord, JobState, JobStatus, JobUpdate, UNKNOWN_PLATFORM};
pub use registry::{JobCounts, JobRegistry, JobRegistryError};
pub use runner::{JobRunner, JobRunnerConfig};
pub use worker::{DownloadJob, ExtractionWorker, WorkerSettings, DEFAULT_USER_AGENT};
