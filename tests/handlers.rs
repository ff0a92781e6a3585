//! Handler-level tests using tower::ServiceExt::oneshot.
//!
//! Drives the full Axum router without binding a TCP listener; upstream is
//! a wiremock server and ffmpeg is replaced by a recording tool.

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{RecordingTool, mount_manifest, mount_playlist, mount_segment};
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Arc;
use streamclip::config::Config;
use streamclip::server::{build_router, state::AppState};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a test config pointed at the mock upstream.
fn test_config(upstream: &str, root: &Path) -> Config {
    Config {
        port: 0,
        is_dev: true,
        upstream_base_url: format!("{upstream}/live"),
        clips_dir: root.join("clips"),
        previews_dir: root.join("previews"),
        ffmpeg_path: "ffmpeg".into(),
        request_timeout_secs: 5,
        playlist_cache_ttl_secs: 3600,
        resolve_max_attempts: 3,
        cache_sweep_interval_secs: 300,
        rate_limit_rpm: 0,
    }
}

fn app(config: Config, tool: Arc<RecordingTool>) -> Router {
    build_router(AppState::with_media_tool(config, tool))
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200_with_json() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, json) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].is_number());
    assert_eq!(json["cached_channels"], 0);
}

#[tokio::test]
async fn responses_include_version_header() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();

    let version = resp
        .headers()
        .get("x-streamclip-version")
        .expect("missing X-Streamclip-Version header");
    assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, _) = get(app, "/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_route_absent_without_recorder() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, _) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Channel validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn empty_channel_is_bad_request() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, json) = get(app.clone(), "/clip/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], 400);

    let (status, _) = get(app, "/preview/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn traversal_channel_is_bad_request() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config("http://127.0.0.1:9", root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, _) = get(app, "/clip/..%2Fetc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Clip / preview ──────────────────────────────────────────────────────────

#[tokio::test]
async fn clip_returns_relative_path() {
    let server = MockServer::start().await;
    mount_manifest(&server, "examplestreamer").await;
    mount_playlist(&server, "examplestreamer", &["a.ts", "b.ts"]).await;
    mount_segment(&server, "a.ts", "A").await;
    mount_segment(&server, "b.ts", "B").await;

    let root = tempfile::tempdir().unwrap();
    let tool = Arc::new(RecordingTool::default());
    let app = app(test_config(&server.uri(), root.path()), tool.clone());

    let (status, json) = get(app, "/clip/ExampleStreamer").await;
    assert_eq!(status, StatusCode::OK);

    let path = json["path"].as_str().unwrap();
    assert!(path.starts_with("examplestreamer/"), "{path}");
    assert!(path.ends_with(".mp4"), "{path}");
    assert!(root.path().join("clips").join(path).exists());
    assert_eq!(tool.transcodes.lock().unwrap()[0], b"AB".to_vec());
}

#[tokio::test]
async fn preview_returns_relative_path() {
    let server = MockServer::start().await;
    mount_manifest(&server, "examplestreamer").await;
    mount_playlist(&server, "examplestreamer", &["a.ts", "b.ts"]).await;
    mount_segment(&server, "b.ts", "B").await;

    let root = tempfile::tempdir().unwrap();
    let tool = Arc::new(RecordingTool::default());
    let app = app(test_config(&server.uri(), root.path()), tool.clone());

    let (status, json) = get(app, "/preview/examplestreamer").await;
    assert_eq!(status, StatusCode::OK);

    let path = json["path"].as_str().unwrap();
    assert!(path.starts_with("examplestreamer/"), "{path}");
    assert!(path.ends_with(".jpg"), "{path}");
    assert!(root.path().join("previews").join(path).exists());
}

#[tokio::test]
async fn offline_channel_returns_404_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/offlinestreamer"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let tool = Arc::new(RecordingTool::default());
    let app = app(test_config(&server.uri(), root.path()), tool.clone());

    let (status, json) = get(app, "/clip/offlinestreamer").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], 404);
    assert!(json["message"].as_str().unwrap().contains("offlinestreamer"));
    assert_eq!(tool.transcode_calls(), 0);
}

#[tokio::test]
async fn upstream_error_returns_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/examplestreamer"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let app = app(
        test_config(&server.uri(), root.path()),
        Arc::new(RecordingTool::default()),
    );

    let (status, json) = get(app, "/preview/examplestreamer").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["message"].as_str().unwrap().contains("boom"));
}

// ── Rate limiting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rate_limiter_blocks_after_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/offlinestreamer"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(&server.uri(), root.path());
    config.rate_limit_rpm = 2;
    let app = app(config, Arc::new(RecordingTool::default()));

    for _ in 0..2 {
        let (status, _) = get(app.clone(), "/clip/offlinestreamer").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // Third request for the same channel never reaches upstream
    let (status, json) = get(app.clone(), "/preview/offlinestreamer").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], 429);

    // Other channels keep their own window
    let (status, _) = get(app, "/clip/otherchannel").await;
    assert_ne!(status, StatusCode::TOO_MANY_REQUESTS);
}
