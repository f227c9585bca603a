use std::collections::BTreeMap;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AxumAppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    jobs: JobsHealth,
    running_workers: usize,
}

#[derive(Serialize)]
pub struct JobsHealth {
    total: usize,
    by_status: BTreeMap<&'static str, usize>,
}

/// Health check endpoint
///
/// Reports registry size broken down by status and the number of workers
/// the runner is tracking. The service has no external dependencies to
/// probe, so it is healthy whenever it can answer.
pub async fn health_handler(
    Extension(state): Extension<AxumAppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let deps = &state.server_deps;
    let counts = deps.registry.counts();

    let by_status = counts
        .by_status
        .iter()
        .map(|(status, count)| (status.as_str(), *count))
        .collect();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            jobs: JobsHealth {
                total: counts.total,
                by_status,
            },
            running_workers: deps.runner.active(),
        }),
    )
}
