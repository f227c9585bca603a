// Main entry point for the audio fetch server

use std::sync::Arc;

use anyhow::{Context, Result};
use fetch_core::{
    kernel::{scheduled_tasks::start_scheduler, YtDlpExtractor},
    server::{build_app, build_server_deps},
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fetch_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting audio fetch server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        download_dir = %config.download_dir.display(),
        temp_dir = %config.temp_dir.display(),
        ytdlp = %config.ytdlp_path.display(),
        "Configuration loaded"
    );

    for dir in [&config.download_dir, &config.temp_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let extractor = Arc::new(YtDlpExtractor::new(config.ytdlp_path.clone()));
    let server_deps = Arc::new(build_server_deps(&config, extractor));

    // Retention sweep only runs when a retention is configured
    let mut scheduler = match config.job_retention {
        Some(retention) => Some(
            start_scheduler(server_deps.registry.clone(), retention)
                .await
                .context("Failed to start scheduled tasks")?,
        ),
        None => None,
    };

    let app = build_app(server_deps.clone());

    // Start server
    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped accepting requests");

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Failed to stop scheduler");
        }
    }

    if !server_deps.runner.shutdown(config.shutdown_grace).await {
        tracing::warn!("Exiting with unfinished jobs");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
