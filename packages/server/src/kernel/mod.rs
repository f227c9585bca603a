//! Kernel module - job infrastructure and external engine dependencies.

pub mod deps;
pub mod error;
pub mod jobs;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;
pub mod yt_dlp;

pub use deps::ServerDeps;
pub use error::{ExtractionError, ProgressParseError};
pub use test_dependencies::{MockExtractor, MockOutcome};
pub use traits::*;
pub use yt_dlp::YtDlpExtractor;
