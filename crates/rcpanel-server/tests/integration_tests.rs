//! Integration tests for the panel server.
//!
//! Each test starts the real server on an ephemeral port over a scripted
//! transport and talks to it with reqwest, the way a browser would.

use axum::body::{to_bytes, Body};
use axum::http::Request;
use futures::StreamExt;
use rcpanel_core::transport::{MockTransport, RpcReply};
use rcpanel_core::RcClient;
use rcpanel_server::{build_router, start_server, AppState};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const EVENT_STREAM: &str = "text/event-stream";

async fn serve(mock: MockTransport) -> (String, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let client = RcClient::new(mock.clone());
    let addr = start_server(AppState::new(client), "127.0.0.1:0")
        .await
        .unwrap();
    (format!("http://{}", addr), mock)
}

fn remotes_mock() -> MockTransport {
    MockTransport::new()
        .reply("config/listremotes", 200, r#"{"remotes":["gdrive","s3"]}"#)
        .respond("config/get", |params| {
            if params.contains("gdrive") {
                RpcReply::ok(r#"{"type":"drive","scope":"drive"}"#)
            } else {
                RpcReply::failure("config unreadable")
            }
        })
}

fn content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn test_remotes_page_lists_remotes_with_types() {
    let (base, _mock) = serve(remotes_mock()).await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(content_type(&response).starts_with("text/html"));

    let html = response.text().await.unwrap();
    assert!(html.contains(r#"<li id="remote-gdrive">"#));
    assert!(html.contains(r#"<span class="type">drive</span>"#));
    assert!(html.contains(r#"<li id="remote-s3">"#));
    assert!(html.contains(r#"<span class="type">unknown</span>"#));
}

#[tokio::test]
async fn test_jobs_page_survives_engine_failure() {
    let (base, _mock) = serve(MockTransport::new()).await;

    let response = reqwest::get(format!("{}/jobs", base)).await.unwrap();
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"<div id="jobs-list">"#));
    assert!(html.contains("No jobs"));
}

#[tokio::test]
async fn test_stats_page_falls_back_to_defaults() {
    let (base, _mock) = serve(MockTransport::new()).await;

    let html = reqwest::get(format!("{}/stats", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"<div id="stats-content">"#));
    assert!(html.contains("rclone unknown"));
}

// ============================================================================
// Streaming actions
// ============================================================================

#[tokio::test]
async fn test_refresh_remotes_streams_patch() {
    let (base, _mock) = serve(remotes_mock()).await;

    let response = reqwest::get(format!("{}/api/remotes/refresh", base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(content_type(&response).starts_with(EVENT_STREAM));

    let body = response.text().await.unwrap();
    assert!(body.contains("event: datastar-patch-elements"));
    assert!(body.contains("data: selector #remotes-list"));
    assert!(body.contains("remote-gdrive"));
}

#[tokio::test]
async fn test_browse_parent_of_root_lists_root() {
    let mock = MockTransport::new().reply(
        "operations/list",
        200,
        r#"{"list":[{"Path":"docs","Name":"docs","Size":-1,"ModTime":"2024-01-01T00:00:00Z","IsDir":true}]}"#,
    );
    let (base, mock) = serve(mock).await;

    let body = reqwest::get(format!("{}/api/remotes/gdrive/browse?path=..", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let calls = mock.calls_to("operations/list");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].params_json(), json!({"fs": "gdrive:", "remote": ""}));
    assert!(body.contains("data: selector #file-browser"));
    assert!(body.contains("entry-docs"));
}

#[tokio::test]
async fn test_browse_streams_names_with_carriage_returns() {
    let mock = MockTransport::new().reply(
        "operations/list",
        200,
        r#"{"list":[{"Path":"evil\rname","Name":"evil\rname","Size":3,"ModTime":"2024-01-01T00:00:00Z","IsDir":false}]}"#,
    );
    let (base, _mock) = serve(mock).await;

    let response = reqwest::get(format!("{}/api/remotes/r/browse?path=", base))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();

    assert!(body.contains("data: selector #file-browser"));
    assert!(body.contains("entry-evil_0dname"));
    for line in body.split('\n') {
        assert!(!line.contains('\r'), "raw carriage return in frame: {:?}", line);
    }
}

#[tokio::test]
async fn test_delete_remote_removes_row() {
    let mock = MockTransport::new().reply("config/delete", 200, "{}");
    let (base, mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .delete(format!("{}/api/remotes/gdrive", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(mock.calls_to("config/delete")[0].params_json(), json!({"name": "gdrive"}));
    assert!(body.contains("data: selector #remote-gdrive"));
    assert!(body.contains("data: mode remove"));
}

#[tokio::test]
async fn test_delete_remote_failure_patches_error_region() {
    let mock = MockTransport::new().reply("config/delete", 500, r#"{"error":"remote not found"}"#);
    let (base, _mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .delete(format!("{}/api/remotes/ghost", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("data: selector #remotes-list"));
    assert!(body.contains("data: mode inner"));
    assert!(body.contains(r#"<div class="error">"#));
    assert!(body.contains("remote not found"));
    assert!(!body.contains("mode remove"));
}

#[tokio::test]
async fn test_delete_directory_entry_purges() {
    let mock = MockTransport::new().reply("operations/purge", 200, "{}");
    let (base, mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .delete(format!("{}/api/remotes/gdrive/entry?path=docs%2Fold&dir=true", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(
        mock.calls_to("operations/purge")[0].params_json(),
        json!({"fs": "gdrive:", "remote": "docs/old"})
    );
    assert!(mock.calls_to("operations/deletefile").is_empty());
    assert!(body.contains("data: selector #entry-docs_2fold"));
}

#[tokio::test]
async fn test_mkdir_creates_and_relists() {
    let mock = MockTransport::new()
        .reply("operations/mkdir", 200, "{}")
        .reply("operations/list", 200, r#"{"list":[]}"#);
    let (base, mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/remotes/gdrive/mkdir", base))
        .json(&json!({"path": "docs", "dir": "new"}))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(
        mock.calls_to("operations/mkdir")[0].params_json(),
        json!({"fs": "gdrive:", "remote": "docs/new"})
    );
    assert_eq!(
        mock.calls_to("operations/list")[0].params_json(),
        json!({"fs": "gdrive:docs", "remote": ""})
    );
    assert!(body.contains("data: selector #file-browser"));
}

#[tokio::test]
async fn test_stop_job_failure_targets_job_row() {
    let mock = MockTransport::new().reply("job/stop", 500, r#"{"error":"boom"}"#);
    let (base, _mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/jobs/7/stop", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("data: selector #job-7"));
    assert!(body.contains("rc error 500 calling job/stop"));
    assert!(body.contains("boom"));
}

#[tokio::test]
async fn test_stop_job_rejects_non_numeric_id() {
    let (base, mock) = serve(MockTransport::new()).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/jobs/abc/stop", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("invalid job id: abc"));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_start_transfer_navigates_to_jobs() {
    let mock = MockTransport::new().reply("sync/copy", 200, r#"{"jobid":3}"#);
    let (base, mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/transfers", base))
        .json(&json!({
            "srcRemote": "a",
            "srcPath": "x",
            "dstRemote": "b",
            "dstPath": "",
            "mode": "copy"
        }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(
        mock.calls_to("sync/copy")[0].params_json(),
        json!({"srcFs": "a:x", "dstFs": "b:", "_async": true})
    );
    let notice = body.find("copy started").unwrap();
    let navigate = body.find(r#"window.location.href = "/jobs""#).unwrap();
    assert!(notice < navigate);
}

#[tokio::test]
async fn test_start_transfer_failure_patches_transfer_status() {
    let mock = MockTransport::new().reply("sync/move", 500, r#"{"error":"directory not found"}"#);
    let (base, _mock) = serve(mock).await;

    let body = reqwest::Client::new()
        .post(format!("{}/api/transfers", base))
        .json(&json!({"srcRemote": "a", "dstRemote": "b", "mode": "move"}))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("data: selector #transfer-status"));
    assert!(body.contains("directory not found"));
    assert!(!body.contains("window.location.href"));
}

// ============================================================================
// Watched job list
// ============================================================================

const PENDING_JOB: &str =
    r#"{"group":"job/4","startTime":"2024-01-01T00:00:00Z","finished":false,"success":false}"#;
const FINISHED_JOB: &str =
    r#"{"group":"job/4","startTime":"2024-01-01T00:00:00Z","endTime":"2024-01-01T00:00:05Z","finished":true,"success":true}"#;

fn watch_request() -> Request<Body> {
    Request::builder()
        .uri("/api/jobs/refresh?watch=true")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_watched_jobs_repatch_until_finished() {
    let polls = Arc::new(AtomicUsize::new(0));
    let seen = polls.clone();
    let mock = Arc::new(
        MockTransport::new()
            .reply("job/list", 200, r#"{"jobids":[4]}"#)
            .respond("job/status", move |_| {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    RpcReply::ok(PENDING_JOB)
                } else {
                    RpcReply::ok(FINISHED_JOB)
                }
            }),
    );
    let app = build_router(AppState::new(RcClient::new(mock.clone())));

    let response = app.oneshot(watch_request()).await.unwrap();
    assert_eq!(response.status(), 200);
    let bytes = tokio::time::timeout(Duration::from_secs(60), to_bytes(response.into_body(), usize::MAX))
        .await
        .expect("watch stream did not end")
        .unwrap();
    let body = String::from_utf8_lossy(&bytes);

    assert_eq!(body.matches("data: selector #jobs-list").count(), 2);
    let first = body.find("1 running, 0 finished, 0 failed").unwrap();
    let second = body.find("0 running, 1 finished, 0 failed").unwrap();
    assert!(first < second);
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_watched_jobs_stop_when_browser_leaves() {
    let mock = Arc::new(
        MockTransport::new()
            .reply("job/list", 200, r#"{"jobids":[4]}"#)
            .reply("job/status", 200, PENDING_JOB),
    );
    let app = build_router(AppState::new(RcClient::new(mock.clone())));

    let response = app.oneshot(watch_request()).await.unwrap();
    let mut frames = response.into_body().into_data_stream();
    let mut seen = String::new();
    while !seen.contains("#jobs-list") {
        let frame = frames.next().await.unwrap().unwrap();
        seen.push_str(&String::from_utf8_lossy(&frame));
    }
    drop(frames);

    let polls = mock.calls_to("job/status").len();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(mock.calls_to("job/status").len() <= polls + 1);
    let settled = mock.calls_to("job/status").len();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(mock.calls_to("job/status").len(), settled);
}

#[tokio::test]
async fn test_stats_stream_patches_content_and_signals() {
    let mock = MockTransport::new()
        .reply("core/version", 200, r#"{"version":"v1.68.0","goVersion":"go1.22","os":"linux","arch":"amd64"}"#)
        .reply("core/stats", 200, r#"{"bytes":2048,"speed":0,"transfers":1}"#);
    let (base, _mock) = serve(mock).await;

    let response = reqwest::get(format!("{}/api/stats/stream", base))
        .await
        .unwrap();
    assert!(content_type(&response).starts_with(EVENT_STREAM));

    let mut chunks = response.bytes_stream();
    let mut seen = String::new();
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = chunks.next().await {
            seen.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
            if seen.contains("event: datastar-patch-signals") {
                break;
            }
        }
    })
    .await;
    assert!(read.is_ok(), "no signals event within timeout: {}", seen);

    assert!(seen.contains("data: selector #stats-content"));
    assert!(seen.contains("2.0 KB"));
    assert!(seen.contains("rclone v1.68.0"));
    assert!(seen.contains(r#""stats":{"#));
}

// ============================================================================
// JSON
// ============================================================================

#[tokio::test]
async fn test_health_and_version() {
    let mock = MockTransport::new().reply("core/version", 200, r#"{"version":"v1.68.0"}"#);
    let (base, _mock) = serve(mock).await;

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let version: Value = reqwest::get(format!("{}/api/version", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(version["version"], "v1.68.0");
    assert_eq!(version["os"], "unknown");
}

#[tokio::test]
async fn test_job_summary_counts_states() {
    let mock = MockTransport::new()
        .reply("job/list", 200, r#"{"jobids":[1,2]}"#)
        .respond("job/status", |params| {
            if params.contains("\"jobid\":1") {
                RpcReply::ok(r#"{"group":"job/1","startTime":"2024-01-01T00:00:00Z","finished":false,"success":false}"#)
            } else {
                RpcReply::ok(r#"{"group":"job/2","startTime":"2024-01-01T00:00:00Z","finished":true,"success":true}"#)
            }
        });
    let (base, _mock) = serve(mock).await;

    let summary: Value = reqwest::get(format!("{}/api/jobs/summary", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary, json!({"pending": 1, "succeeded": 1, "failed": 0}));
}
