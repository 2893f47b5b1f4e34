mod common;

use common::TestApp;
use people_service::services::init_metrics;
use reqwest::Client;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn_in_memory().await;
    let client = Client::new();

    let response = client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "people-service");

    app.cleanup().await;
}

#[tokio::test]
async fn index_serves_greeting_over_tcp() {
    let app = TestApp::spawn_in_memory().await;

    let body = Client::new()
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");

    assert_eq!(body, "Hello world!");

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_reports_request_counts() {
    init_metrics().expect("Failed to install metrics recorder");
    let app = TestApp::spawn_in_memory().await;
    let client = Client::new();

    let response = client
        .get(app.url("/people"))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());

    let response = client
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type")
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.expect("Failed to get response body");
    assert!(
        body.lines().any(|line| line.starts_with("http_requests_total{")
            && line.contains("method=\"GET\"")
            && line.contains("path=\"/people\"")
            && line.contains("status=\"200\"")),
        "Missing request counter for GET /people: {}",
        body
    );

    app.cleanup().await;
}
