//! Integration tests for the reqwest-backed client against a mock server.

use std::sync::Arc;
use std::time::Duration;

use antenati_core::{
    ClientConfig, Concurrency, DownloadError, EngineError, FetchEngine, HttpClient, Item,
    NoProgress, RunSummary, Transport,
};
use futures_util::StreamExt;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn client() -> HttpClient {
    HttpClient::new(&ClientConfig::default()).unwrap()
}

fn image(status: u16, content_type: &str, body: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("Content-Type", content_type)
        .set_body_bytes(body.to_vec())
}

#[tokio::test]
async fn test_requests_carry_browser_headers() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/iiif/1/full/full/0/default.jpg"))
        .and(header("referer", "https://antenati.cultura.gov.it/"))
        .and(header("origin", "https://antenati.cultura.gov.it"))
        .and(header_exists("user-agent"))
        .respond_with(image(200, "image/jpeg", b"jpeg-bytes"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/iiif/1/full/full/0/default.jpg", mock_server.uri());
    let response = client().get(&url).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type.as_deref(), Some("image/jpeg"));
    let mut body = Vec::new();
    let mut stream = response.body;
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, b"jpeg-bytes");
}

#[tokio::test]
async fn test_user_agent_looks_like_a_browser() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/ua"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    client()
        .get_text(&format!("{}/ua", mock_server.uri()))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let user_agent = requests[0]
        .headers
        .get("user-agent")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(user_agent.starts_with("Mozilla/5.0"), "{user_agent}");
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let response = client()
        .get(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_get_text_rejects_error_status() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let result = client()
        .get_text(&format!("{}/forbidden", mock_server.uri()))
        .await;
    assert!(matches!(
        result,
        Err(DownloadError::HttpStatus { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            image(200, "image/jpeg", b"late").set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let config = ClientConfig::default()
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(200));
    let client = HttpClient::new(&config).unwrap();

    let result = client.get(&format!("{}/slow", mock_server.uri())).await;
    assert!(matches!(result, Err(DownloadError::Timeout { .. })));
}

#[tokio::test]
async fn test_engine_over_http_saves_images_and_reports_failures() {
    let mock_server = require_mock_server!();

    Mock::given(method("GET"))
        .and(path("/img/1"))
        .respond_with(image(200, "image/jpeg", &[7u8; 1000]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/2"))
        .respond_with(image(202, "image/png", &[9u8; 2000]))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/4"))
        .respond_with(image(200, "application/octet-stream", b"??"))
        .mount(&mock_server)
        .await;

    let items: Vec<Item> = (1..=4)
        .map(|i| {
            Item::new(
                format!("c{i}"),
                format!("pag. {i}"),
                format!("{}/img/{i}", mock_server.uri()),
            )
        })
        .collect();
    let dir = TempDir::new().unwrap();
    let engine = FetchEngine::new(Arc::new(client()));

    let result = engine
        .run(&items, Concurrency::new(4, 2).unwrap(), dir.path(), &NoProgress)
        .await;
    let summary: RunSummary = match result {
        Err(EngineError::PartialFailure(summary)) => summary,
        other => panic!("expected partial failure, got {other:?}"),
    };

    assert_eq!(summary.total_bytes(), 3000);
    assert_eq!(summary.failures().len(), 2);
    assert!(summary.failures()["pag. 3"].starts_with("HTTP error 500"));
    assert!(summary.failures()["pag. 4"].contains("application/octet-stream"));
    assert_eq!(
        std::fs::read(dir.path().join("pag-1.jpg")).unwrap(),
        vec![7u8; 1000]
    );
    assert_eq!(
        std::fs::metadata(dir.path().join("pag-2.png")).unwrap().len(),
        2000
    );
    assert!(!dir.path().join("pag-3.html").exists());
}
