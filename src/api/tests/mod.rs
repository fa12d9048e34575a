use super::*;
use crate::downloader::test_helpers::{ScriptedLauncher, ScriptedRun};
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


const SIGN_IN: &str = "ERROR: [youtube] abc: Sign in to confirm you're not a bot";

/// Helper to create a test MediaDownloader instance wrapped in Arc
async fn create_test_downloader(
    runs: Vec<ScriptedRun>,
    with_cookies: bool,
) -> (
    Arc<MediaDownloader>,
    Arc<ScriptedLauncher>,
    tempfile::TempDir,
) {
    let launcher = ScriptedLauncher::new(runs);
    let (downloader, temp_dir) =
        crate::downloader::test_helpers::create_test_downloader(launcher.clone(), with_cookies)
            .await;
    (Arc::new(downloader), launcher, temp_dir)
}

/// Router over a scripted downloader, using the downloader's own config
fn router_for(downloader: &Arc<MediaDownloader>) -> Router {
    create_router(downloader.clone(), downloader.config().clone())
}

async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// JSON payloads of every `data:` line of an event stream body
fn sse_payloads(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown() {
    let (downloader, _launcher, _temp_dir) = create_test_downloader(Vec::new(), false).await;

    let mut config = (**downloader.config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server_with_shutdown(
        downloader,
        config,
        async move {
            let _ = stop_rx.await;
        },
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, _launcher, _temp_dir) = create_test_downloader(Vec::new(), false).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = router_for(&downloader).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (downloader, _launcher, _temp_dir) = create_test_downloader(Vec::new(), false).await;

    let mut config = (**downloader.config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[test]
fn test_cors_specific_origins() {
    // Only checks that building a restricted layer does not panic on bad entries
    let _layer = build_cors_layer(&[
        "http://localhost:5173".to_string(),
        "not a header\u{7f}".to_string(),
    ]);
}
