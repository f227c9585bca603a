//! HTTP-level tests for submission, status, artifact and info endpoints.

mod common;

use std::collections::HashSet;

use axum::http::{header, StatusCode};
use common::TestHarness;
use fetch_core::common::JobId;
use fetch_core::kernel::jobs::{JobState, JobStatus};
use fetch_core::kernel::MockExtractor;
use serde_json::json;

// =============================================================================
// POST /download
// =============================================================================

#[tokio::test]
async fn empty_url_is_rejected_without_creating_a_job() {
    let harness = TestHarness::new();

    for body in [json!({"url": ""}), json!({"url": "   "}), json!({})] {
        let response = harness.post_json("/download", body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json(), json!({"error": "Empty URL"}));
    }

    assert!(harness.deps.registry.is_empty());
    assert!(harness.extractor.calls().is_empty());
}

#[tokio::test]
async fn unsupported_format_lists_the_valid_ones() {
    let harness = TestHarness::new();

    let response = harness
        .post_json(
            "/download",
            json!({"url": "https://youtu.be/abc", "format": "aac"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["error"],
        "Invalid format. Supported formats: mp3, wav, m4a, flac, opus, vorbis"
    );
    assert!(harness.deps.registry.is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let harness = TestHarness::new();

    let response = harness.post_raw("/download", "{not json").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());
    assert!(harness.deps.registry.is_empty());
}

#[tokio::test]
async fn format_is_case_insensitive_and_defaults_apply() {
    let harness = TestHarness::new();

    let id = harness
        .submit(json!({"url": "  https://www.youtube.com/watch?v=abc  ", "format": "FLAC"}))
        .await;
    harness.wait_for_terminal(&id).await;

    let calls = harness.extractor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "https://www.youtube.com/watch?v=abc");
    assert_eq!(calls[0].format.codec(), "flac");
    assert_eq!(calls[0].quality, "192");
    assert!(calls[0].referer.is_none());
}

#[tokio::test]
async fn numeric_quality_is_forwarded() {
    let harness = TestHarness::new();

    let id = harness
        .submit(json!({"url": "https://soundcloud.com/a/b", "quality": 320}))
        .await;
    harness.wait_for_terminal(&id).await;

    assert_eq!(harness.extractor.calls()[0].quality, "320");
}

#[tokio::test]
async fn concurrent_submissions_get_distinct_ids() {
    let harness = TestHarness::new();

    let submissions = (0..20).map(|i| {
        harness.submit(json!({"url": format!("https://vimeo.com/{}", i)}))
    });
    let ids: Vec<JobId> = futures::future::join_all(submissions).await;

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(harness.deps.registry.len(), 20);
}

// =============================================================================
// GET /status/:id
// =============================================================================

#[tokio::test]
async fn unknown_status_id_is_not_found() {
    let harness = TestHarness::new();

    for uri in [
        format!("/status/{}", JobId::new()),
        "/status/not-a-uuid".to_string(),
    ] {
        let response = harness.get(&uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({"error": "Download not found"}));
    }
}

#[tokio::test]
async fn completed_job_reports_file_details() {
    let harness = TestHarness::with_extractor(MockExtractor::producing("Night Drive", 212.5));

    let id = harness
        .submit(json!({"url": "https://www.youtube.com/watch?v=xyz"}))
        .await;
    harness.wait_for_terminal(&id).await;

    let status = harness.get(&format!("/status/{}", id)).await;
    assert_eq!(status.status, StatusCode::OK);

    let body = status.json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["filename"], "Night Drive.mp3");
    assert_eq!(body["title"], "Night Drive");
    assert_eq!(body["duration"], 212.5);
    assert_eq!(body["format"], "mp3");
    assert_eq!(body["platform"], "youtube");
}

#[tokio::test]
async fn spotify_links_end_in_error() {
    let harness = TestHarness::new();

    let id = harness
        .submit(json!({"url": "https://open.spotify.com/track/123"}))
        .await;
    let record = harness.wait_for_terminal(&id).await;

    assert_eq!(record.status(), JobStatus::Error);
    assert_eq!(record.platform.as_deref(), Some("spotify"));
    match record.state {
        JobState::Error { error } => assert!(error.contains("Spotify")),
        other => panic!("unexpected state {:?}", other),
    }
    assert!(harness.extractor.calls().is_empty());

    let body = harness.get(&format!("/status/{}", id)).await.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["platform"], "spotify");
}

#[tokio::test]
async fn engine_failure_is_reported_on_status() {
    let harness = TestHarness::with_extractor(MockExtractor::failing("Video unavailable"));

    let id = harness
        .submit(json!({"url": "https://www.dailymotion.com/video/x1"}))
        .await;
    harness.wait_for_terminal(&id).await;

    let body = harness.get(&format!("/status/{}", id)).await.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "Video unavailable");
    assert_eq!(body["platform"], "dailymotion");
}

#[tokio::test]
async fn extractor_panic_becomes_error_status() {
    let harness = TestHarness::with_extractor(MockExtractor::panicking("decoder blew up"));

    let id = harness.submit(json!({"url": "https://example.com/a"})).await;
    let record = harness.wait_for_terminal(&id).await;

    assert_eq!(record.status(), JobStatus::Error);
    match record.state {
        JobState::Error { error } => assert!(error.contains("decoder blew up")),
        other => panic!("unexpected state {:?}", other),
    }
}

// =============================================================================
// GET /file/:filename
// =============================================================================

#[tokio::test]
async fn completed_file_downloads_as_attachment() {
    let harness = TestHarness::new();

    let id = harness.submit(json!({"url": "https://vimeo.com/42"})).await;
    let record = harness.wait_for_terminal(&id).await;
    let filename = match record.state {
        JobState::Completed { filename, .. } => filename,
        other => panic!("unexpected state {:?}", other),
    };
    assert!(harness.download_dir.path().join(&filename).exists());

    let response = harness.get("/file/Test%20Track.mp3").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"mock audio");
    assert_eq!(response.headers[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Test Track.mp3\""
    );
}

#[tokio::test]
async fn unknown_file_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.get("/file/missing.mp3").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({"error": "File not found"}));
}

#[tokio::test]
async fn path_traversal_is_not_found() {
    let harness = TestHarness::new();
    std::fs::write(harness.temp_dir.path().join("scratch.mp3"), b"x").unwrap();

    for uri in ["/file/..%2Fscratch.mp3", "/file/%2E%2E", "/file/..%5Cscratch.mp3"] {
        let response = harness.get(uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

// =============================================================================
// Info endpoints
// =============================================================================

#[tokio::test]
async fn platforms_lists_labels_formats_and_qualities() {
    let harness = TestHarness::new();

    let body = harness.get("/platforms").await.json();

    let platforms = body["platforms"].as_array().unwrap();
    assert_eq!(platforms.len(), 12);
    assert_eq!(platforms.first().unwrap(), "youtube");
    assert_eq!(platforms.last().unwrap(), "generic");
    assert_eq!(
        body["formats"],
        json!(["mp3", "wav", "m4a", "flac", "opus", "vorbis"])
    );
    assert_eq!(body["qualities"], json!(["128", "192", "256", "320"]));
}

#[tokio::test]
async fn health_counts_jobs_by_status() {
    let harness = TestHarness::new();

    let id = harness.submit(json!({"url": "https://vimeo.com/1"})).await;
    harness.wait_for_terminal(&id).await;

    let response = harness.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["jobs"]["total"], 1);
    assert_eq!(body["jobs"]["by_status"]["completed"], 1);
    assert!(body["running_workers"].is_u64());
}

#[tokio::test]
async fn index_page_is_served() {
    let harness = TestHarness::new();

    let response = harness.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8_lossy(&response.body).contains("Audio Fetch"));
}
