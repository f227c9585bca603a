// Audio Fetch - API Core
//
// HTTP service that accepts media URLs, extracts the audio track with an
// external engine in the background, and serves the finished files.

pub mod common;
pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
