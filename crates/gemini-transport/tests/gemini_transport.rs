use std::time::Duration;

use parley_gemini_transport::{GeminiConfigBuilder, GeminiTransport};
use parley_model::{ChatMessage, ErrorKind, Transport, TransportRequest};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn transport_for(server: &MockServer) -> GeminiTransport {
    let config = GeminiConfigBuilder::with_api_key("test-key")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(500))
        .build();
    GeminiTransport::new(config)
}

fn hello_request() -> TransportRequest {
    TransportRequest {
        messages: vec![ChatMessage::user("Hello")],
    }
}

#[tokio::test]
async fn generate_content_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Hello" }] },
                { "role": "model", "parts": [{ "text": "Hi there" }] },
                {
                    "role": "user",
                    "parts": [{ "text": "Any tips for sleep?" }]
                },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Keep a **regular** schedule." }]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let req = TransportRequest {
        messages: vec![
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi there"),
            ChatMessage::user("Any tips for sleep?"),
        ],
    };
    let answer = transport_for(&server).send(&req).await.unwrap();
    assert_eq!(answer, "Keep a **regular** schedule.");
}

#[tokio::test]
async fn server_error_is_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("internal error"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonSuccessStatus);
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.detail(), "internal error");
}

#[tokio::test]
async fn missing_candidates_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{ not json", "application/json"),
        )
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn html_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "candidates": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = GeminiConfigBuilder::with_api_key("test-key")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(50))
        .build();
    let err = GeminiTransport::new(config)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn unreachable_endpoint_is_network_failure() {
    let config = GeminiConfigBuilder::with_api_key("test-key")
        .with_base_url("http://127.0.0.1:1")
        .build();
    let err = GeminiTransport::new(config)
        .send(&hello_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}
