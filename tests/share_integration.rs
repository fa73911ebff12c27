//! Integration tests for sharing a session through the HTTP share service

mod common;

use std::sync::Arc;

use common::builders::{local_session, session_with};
use common::texts;
use common::test_timeout;
use streamlab_rs::config::EngineConfig;
use streamlab_rs::engine::LocalEngine;
use streamlab_rs::session::LogStyle;
use streamlab_rs::share::{HttpShareService, ShareService};
use url::Url;

fn http_service(origin: &str) -> Arc<HttpShareService> {
    Arc::new(HttpShareService::new(Url::parse(origin).unwrap(), test_timeout()).unwrap())
}

#[tokio::test]
async fn test_share_returns_link_for_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/share")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "input": "a\n",
            "config": "b: 1\n"
        })))
        .with_status(200)
        .with_body("abc123")
        .create_async()
        .await;

    let url = http_service(&server.url())
        .share("a\n", "b: 1\n")
        .await
        .unwrap();

    assert_eq!(url.as_str(), format!("{}/l/abc123", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_session_share_logs_link() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/share")
        .with_status(200)
        .with_body("abc123")
        .create_async()
        .await;

    let session = session_with(
        Arc::new(LocalEngine::new(EngineConfig::default())),
        http_service(&server.url()),
        "b: 1\n",
        "a\n",
    );

    let url = session.request_share().await.expect("share should succeed");
    let links: Vec<_> = session
        .log()
        .entries()
        .into_iter()
        .filter(|e| e.is(LogStyle::Link))
        .collect();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].text, format!("Session saved at: {}", url));
}

#[tokio::test]
async fn test_session_share_failure_logs_one_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/share")
        .with_status(500)
        .create_async()
        .await;

    let session = session_with(
        Arc::new(LocalEngine::new(EngineConfig::default())),
        http_service(&server.url()),
        "b: 1\n",
        "a\n",
    );
    let before = session.snapshot();

    assert!(session.request_share().await.is_none());

    assert_eq!(
        texts(session.log()),
        vec!["Error: failed to save state: Request failed with status: 500"]
    );
    let after = session.snapshot();
    assert_eq!(after.config_revision, before.config_revision);
    assert_eq!(after.input_revision, before.input_revision);
    assert_eq!(after.controls, before.controls);
}

#[tokio::test]
async fn test_share_does_not_touch_compiled_state() {
    let (session, share) = local_session("pipeline: {}", "x");
    session.request_compile().await;

    assert!(session.request_share().await.is_some());

    assert!(session.is_compiled());
    assert_eq!(share.call_count(), 1);
    let calls = share.calls.lock().unwrap();
    assert_eq!(calls[0], ("x".to_string(), "pipeline: {}".to_string()));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Nothing listens on port 1
    let svc = http_service("http://127.0.0.1:1");
    let err = svc.share("", "").await.unwrap_err();
    assert_eq!(err.kind(), streamlab_rs::error::ErrorKind::Transport);
}
