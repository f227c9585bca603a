//! Typed errors raised by the extraction engine seam.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while running the external extraction engine.
///
/// Inside a worker every variant ends up as a terminal `error` record
/// carrying the display message.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The engine binary could not be launched
    #[error("failed to launch extraction engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure
    #[error("{0}")]
    EngineFailed(String),

    /// The engine exited successfully without describing what it produced
    #[error("extraction engine returned no media information")]
    MissingMetadata,

    /// The engine's metadata line was not valid JSON
    #[error("invalid media information from engine: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    /// The engine reported success but the converted file is absent
    #[error("The {format} file could not be created")]
    OutputMissing { format: String, path: PathBuf },

    /// Filesystem error while handling engine output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A progress line from the engine that could not be understood.
///
/// Progress is advisory; these are logged and dropped.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unparseable progress line: {line}")]
pub struct ProgressParseError {
    pub line: String,
}
