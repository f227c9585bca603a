use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{AudioFormat, JobId, DEFAULT_QUALITY};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Forwarded to the engine untouched; clients send both `"192"` and `192`.
    #[serde(default)]
    pub quality: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub download_id: JobId,
}

/// Accept a download request and start it in the background.
///
/// Returns as soon as the job is recorded as `queued`; progress is polled
/// through `/status/:id`.
pub async fn download_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected download body");
        ApiError::validation("Invalid JSON body")
    })?;

    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::validation("Empty URL"));
    }

    let format = match request.format.as_deref() {
        Some(raw) => raw
            .parse::<AudioFormat>()
            .map_err(|e| ApiError::validation(e.to_string()))?,
        None => AudioFormat::default(),
    };

    let quality = quality_value(request.quality);

    let download_id = state
        .server_deps
        .submit_download(url.to_string(), format, quality)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(DownloadResponse { download_id }))
}

fn quality_value(raw: Option<Value>) -> String {
    match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => DEFAULT_QUALITY.to_string(),
    }
}
