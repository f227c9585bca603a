//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::{JobRegistry, JobRunner, JobRunnerConfig, WorkerSettings};
use crate::kernel::{BaseMediaExtractor, ServerDeps};
use crate::server::routes::{
    download_handler, file_handler, health_handler, platforms_handler, status_handler,
};
use crate::server::static_files::{serve_index, serve_ui_asset};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
}

/// Wire the registry, runner and worker settings around an extractor.
///
/// The registry created here is the only one the process uses; handlers
/// and background tasks reach it through the returned deps.
pub fn build_server_deps(config: &Config, extractor: Arc<dyn BaseMediaExtractor>) -> ServerDeps {
    let registry = Arc::new(JobRegistry::new());
    let runner = Arc::new(JobRunner::with_config(
        registry.clone(),
        JobRunnerConfig {
            max_concurrent_jobs: config.max_concurrent_jobs,
        },
    ));
    let settings = Arc::new(
        WorkerSettings::new(config.temp_dir.clone(), config.download_dir.clone())
            .with_socket_timeout(config.socket_timeout),
    );

    ServerDeps::new(registry, runner, extractor, settings)
}

/// Build the Axum application router
pub fn build_app(server_deps: Arc<ServerDeps>) -> Router {
    let app_state = AxumAppState { server_deps };

    // CORS configuration - the UI may be served from anywhere
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/", get(serve_index))
        .route("/download", post(download_handler))
        .route("/status/:id", get(status_handler))
        .route("/file/:filename", get(file_handler))
        .route("/platforms", get(platforms_handler))
        .route("/health", get(health_handler))
        .fallback(serve_ui_asset)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
