// tests/gemini_client.rs
// GeminiClient against a local stand-in for the generativelanguage API.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::Value;

use chat_relay::gemini::{GeminiClient, Generator, ModelRequest, StreamEvent, UpstreamError};
use chat_relay::types::ImageAttachment;

#[derive(Clone)]
struct Upstream {
    /// Raw SSE body to return, or None to fail with 403.
    body: Option<&'static str>,
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn mock_generate(
    State(upstream): State<Upstream>,
    Path(model_op): Path<String>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    body: String,
) -> impl IntoResponse {
    assert_eq!(query.get("alt").map(String::as_str), Some("sse"));
    assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
    let request: Value = serde_json::from_str(&body).unwrap();
    upstream.seen.lock().unwrap().push((model_op, request));

    match upstream.body {
        Some(sse) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/event-stream")],
            sse,
        )
            .into_response(),
        None => (StatusCode::FORBIDDEN, "key rejected").into_response(),
    }
}

async fn spawn_upstream(body: Option<&'static str>) -> (String, Arc<Mutex<Vec<(String, Value)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let upstream = Upstream {
        body,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/{model_op}", post(mock_generate))
        .with_state(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

async fn collect(mut rx: tokio::sync::mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn streams_text_deltas_from_sse_chunks() {
    // CRLF framing, as the vendor sends it.
    let sse = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n\
               data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}\r\n\r\n";
    let (base, seen) = spawn_upstream(Some(sse)).await;

    let client = GeminiClient::new("test-key".into()).with_base_url(base);
    let rx = client
        .stream_turn(ModelRequest::Text {
            message: "hi".into(),
            history: vec![],
        })
        .await
        .unwrap();

    let events = collect(rx).await;
    assert_eq!(
        events,
        vec![
            StreamEvent::TextDelta("Hel".into()),
            StreamEvent::TextDelta("lo".into()),
            StreamEvent::Done,
        ]
    );

    // Text variant hit the text model with a single text part.
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0.starts_with("gemini-pro:"));
    assert_eq!(seen[0].1["contents"][0]["parts"][0]["text"], "hi");
}

#[tokio::test]
async fn vision_request_hits_vision_model_with_two_parts() {
    let sse = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a dog\"}]}}]}\n\n";
    let (base, seen) = spawn_upstream(Some(sse)).await;

    let client = GeminiClient::new("test-key".into()).with_base_url(base);
    let rx = client
        .stream_turn(ModelRequest::Vision {
            message: "what is this?".into(),
            image: ImageAttachment {
                data: "aGVsbG8=".into(),
                mime_type: "image/png".into(),
            },
            history: vec![],
        })
        .await
        .unwrap();
    collect(rx).await;

    let seen = seen.lock().unwrap();
    assert!(seen[0].0.starts_with("gemini-pro-vision:"));
    let parts = &seen[0].1["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "what is this?");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
}

#[tokio::test]
async fn rejected_key_fails_before_streaming() {
    let (base, _seen) = spawn_upstream(None).await;

    let client = GeminiClient::new("test-key".into()).with_base_url(base);
    let result = client
        .stream_turn(ModelRequest::Text {
            message: "hi".into(),
            history: vec![],
        })
        .await;

    match result {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
            assert!(body.contains("rejected"));
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn unparseable_records_are_dropped_not_fatal() {
    let sse = "data: not json\n\n\
               data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}\n\n";
    let (base, _seen) = spawn_upstream(Some(sse)).await;

    let client = GeminiClient::new("test-key".into()).with_base_url(base);
    let rx = client
        .stream_turn(ModelRequest::Text {
            message: "hi".into(),
            history: vec![],
        })
        .await
        .unwrap();

    let events = collect(rx).await;
    assert_eq!(
        events,
        vec![StreamEvent::TextDelta("ok".into()), StreamEvent::Done]
    );
}
