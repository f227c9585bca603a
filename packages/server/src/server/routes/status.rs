use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::common::JobId;
use crate::kernel::jobs::JobRecord;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const NOT_FOUND: &str = "Download not found";

/// Current snapshot of a job. Ids that don't parse are simply unknown.
pub async fn status_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    let id: JobId = id.parse().map_err(|_| ApiError::not_found(NOT_FOUND))?;

    state
        .server_deps
        .registry
        .get(&id)
        .map(Json)
        .map_err(|_| ApiError::not_found(NOT_FOUND))
}
