use axum::Json;
use serde::Serialize;

use crate::common::{AudioFormat, Platform, QUALITY_PRESETS};

#[derive(Debug, Serialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<Platform>,
    pub formats: Vec<AudioFormat>,
    pub qualities: Vec<&'static str>,
}

/// Lists what the service recognises and produces.
pub async fn platforms_handler() -> Json<PlatformsResponse> {
    Json(PlatformsResponse {
        platforms: Platform::all().to_vec(),
        formats: AudioFormat::all().to_vec(),
        qualities: QUALITY_PRESETS.to_vec(),
    })
}
