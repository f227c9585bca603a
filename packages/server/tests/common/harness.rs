//! Test harness driving the real router with a scripted extractor.
//!
//! Each harness owns its own scratch and output directories, so tests can
//! run in parallel without sharing files or job records.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use fetch_core::{
    common::JobId,
    kernel::{jobs::JobRecord, MockExtractor, ServerDeps},
    server::{build_app, build_server_deps},
    Config,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestHarness {
    pub app: Router,
    pub deps: Arc<ServerDeps>,
    pub extractor: Arc<MockExtractor>,
    pub temp_dir: TempDir,
    pub download_dir: TempDir,
}

/// Buffered response: status, headers and body bytes.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_extractor(MockExtractor::new())
    }

    pub fn with_extractor(extractor: MockExtractor) -> Self {
        Self::with_config(extractor, |_| {})
    }

    pub fn with_config(extractor: MockExtractor, configure: impl FnOnce(&mut Config)) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let temp_dir = tempfile::tempdir().expect("temp dir");
        let download_dir = tempfile::tempdir().expect("download dir");

        let mut config = Config {
            temp_dir: temp_dir.path().to_path_buf(),
            download_dir: download_dir.path().to_path_buf(),
            ..Config::default()
        };
        configure(&mut config);

        let extractor = Arc::new(extractor);
        let deps = Arc::new(build_server_deps(&config, extractor.clone()));
        let app = build_app(deps.clone());

        Self {
            app,
            deps,
            extractor,
            temp_dir,
            download_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
    }

    /// Submit a download and return its id, asserting it was accepted.
    pub async fn submit(&self, body: Value) -> JobId {
        let response = self.post_json("/download", body).await;
        assert_eq!(response.status, StatusCode::OK, "body: {:?}", response.json());
        response.json()["download_id"]
            .as_str()
            .expect("download_id is a string")
            .parse()
            .expect("download_id is a uuid")
    }

    /// Poll the registry until the job reaches a terminal state.
    pub async fn wait_for_terminal(&self, id: &JobId) -> JobRecord {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let record = self.deps.registry.get(id).expect("job exists");
            if record.is_terminal() {
                return record;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} never finished, last state {:?}",
                id,
                record.state
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
