use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use synapse_config::{ProviderConfig, ProviderKind};

use super::OpenAiClient;
use crate::{AiClient, AiError, ChatMessage, Role, DEMO_REPLY};

struct Mock {
    status: StatusCode,
    body: Value,
    hits: AtomicUsize,
    seen: Mutex<Vec<(Option<String>, Value)>>,
}

async fn completions(
    State(mock): State<Arc<Mock>>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    mock.seen.lock().unwrap().push((auth, request));
    (mock.status, Json(mock.body.clone()))
}

/// Serve `body` with `status` on an ephemeral port; returns the endpoint URL.
async fn serve(status: StatusCode, body: Value) -> (String, Arc<Mock>) {
    let mock = Arc::new(Mock {
        status,
        body,
        hits: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1/chat/completions"), mock)
}

fn config(url: &str) -> ProviderConfig {
    ProviderConfig::new(ProviderKind::OpenAi, "sk-test").with_base_url(url)
}

fn history() -> Vec<ChatMessage> {
    vec![ChatMessage::new(Role::User, "hello")]
}

#[tokio::test]
async fn sends_openai_request_and_reads_chat_reply() {
    let (url, mock) = serve(
        StatusCode::OK,
        json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi there"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2}
        }),
    )
    .await;

    let client = OpenAiClient::new();
    let reply = client
        .send_message(&history(), &config(&url).with_max_tokens(256))
        .await
        .unwrap();

    assert_eq!(reply.content, "Hi there");
    assert!(reply.tool_calls.is_empty());
    assert_eq!(reply.usage.total_tokens(), 5);

    let seen = mock.seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["temperature"], 0.7);
    assert_eq!(body["messages"], json!([{"role": "user", "content": "hello"}]));
}

#[tokio::test]
async fn aipipe_uses_its_default_model() {
    let (url, mock) = serve(
        StatusCode::OK,
        json!({"choices": [{"message": {"content": "ok"}}]}),
    )
    .await;

    let config = ProviderConfig::new(ProviderKind::AiPipe, "k").with_base_url(&url);
    OpenAiClient::new()
        .send_message(&history(), &config)
        .await
        .unwrap();

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen[0].1["model"], "openai/gpt-4o-mini");
}

#[tokio::test]
async fn legacy_text_reply() {
    let (url, _mock) = serve(StatusCode::OK, json!({"choices": [{"text": "completion"}]})).await;
    let reply = OpenAiClient::new()
        .send_message(&history(), &config(&url))
        .await
        .unwrap();
    assert_eq!(reply.content, "completion");
}

#[tokio::test]
async fn unsupported_body_is_returned_raw() {
    let (url, _mock) = serve(StatusCode::OK, json!({"weird": true})).await;
    let reply = OpenAiClient::new()
        .send_message(&history(), &config(&url))
        .await
        .unwrap();
    assert_eq!(reply.content, r#"{"weird":true}"#);
}

#[tokio::test]
async fn tool_calls_with_string_arguments() {
    let (url, _mock) = serve(
        StatusCode::OK,
        json!({"choices": [{"message": {
            "content": null,
            "tool_calls": [{
                "id": "call_0",
                "type": "function",
                "function": {"name": "web_search", "arguments": "{\"query\":\"rust\"}"}
            }]
        }}]}),
    )
    .await;

    let reply = OpenAiClient::new()
        .send_message(&history(), &config(&url))
        .await
        .unwrap();
    assert_eq!(reply.content, "");
    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "web_search");
    assert_eq!(reply.tool_calls[0].arguments, json!({"query": "rust"}));
}

#[tokio::test]
async fn http_error_becomes_api_error() {
    let (url, _mock) = serve(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "upstream exploded"}),
    )
    .await;

    let client = OpenAiClient::new();
    let err = client
        .send_message(&history(), &config(&url))
        .await
        .unwrap_err();
    match err {
        AiError::ApiError(msg) => {
            assert!(msg.contains("500"), "{msg}");
            assert!(msg.contains("upstream exploded"), "{msg}");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }

    let reply = client.complete(&history(), &config(&url)).await;
    assert!(reply.content.starts_with("LLM call error: "));
    assert!(reply.content.contains("500"));
}

#[tokio::test]
async fn rate_limit_is_distinguished() {
    let (url, _mock) = serve(StatusCode::TOO_MANY_REQUESTS, json!({})).await;
    let err = OpenAiClient::new()
        .send_message(&history(), &config(&url))
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::RateLimited));
}

#[tokio::test]
async fn transport_failure_is_recovered_into_text() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/v1/chat/completions");
    let reply = OpenAiClient::new().complete(&history(), &config(&url)).await;
    assert!(reply.content.starts_with("LLM call error: "), "{}", reply.content);
    assert!(reply.tool_calls.is_empty());
}

#[tokio::test]
async fn demo_mode_makes_no_requests() {
    let (url, mock) = serve(StatusCode::OK, json!({})).await;
    let config = ProviderConfig::new(ProviderKind::OpenAi, "  ").with_base_url(&url);
    let client = OpenAiClient::new();

    let first = client.complete(&history(), &config).await;
    let second = client.complete(&history(), &config).await;

    assert_eq!(first.content, DEMO_REPLY);
    assert_eq!(first, second);
    assert_eq!(mock.hits.load(Ordering::SeqCst), 0);
}
