//! Integration tests for the completion proxy client and the engine on top of it.
//!
//! Each test spins up a fake chat-completions proxy with Axum on a random
//! port and points a real `ProxyProvider` at it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;

use lead_intake::config::IntakeConfig;
use lead_intake::error::LlmError;
use lead_intake::intake::{ConversationState, IntakeEngine, IntakeStep, ReplySource};
use lead_intake::llm::{
    ChatMessage, CompletionRequest, FinishReason, LlmProvider, ProxyProvider,
};

/// What the fake proxy saw on its last request.
#[derive(Default)]
struct Seen {
    body: Option<Value>,
    authorization: Option<String>,
}

type SharedSeen = Arc<Mutex<Seen>>;

fn record(seen: &SharedSeen, headers: &HeaderMap, body: Value) {
    let mut seen = seen.lock().unwrap();
    seen.authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.body = Some(body);
}

async fn ok_handler(
    State(seen): State<SharedSeen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&seen, &headers, body);
    Json(serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "We can help with that. Share your details here." },
            "finish_reason": "stop"
        }]
    }))
}

async fn fail_handler() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn garbage_handler() -> &'static str {
    "<html>definitely not json</html>"
}

async fn blank_handler() -> Json<Value> {
    Json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": "   " }, "finish_reason": "stop" }]
    }))
}

/// Start the fake proxy, return its base URL and the request recorder.
async fn start_proxy() -> (String, SharedSeen) {
    let seen: SharedSeen = Arc::new(Mutex::new(Seen::default()));
    let app = Router::new()
        .route("/ok", post(ok_handler))
        .route("/fail", post(fail_handler))
        .route("/garbage", post(garbage_handler))
        .route("/blank", post(blank_handler))
        .with_state(Arc::clone(&seen));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), seen)
}

fn config_for(url: String) -> IntakeConfig {
    IntakeConfig {
        proxy_url: Some(url),
        api_key: Some(SecretString::from("test-key".to_string())),
        request_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}

fn ping() -> CompletionRequest {
    CompletionRequest::new(vec![ChatMessage::system("sys"), ChatMessage::user("Ping")])
        .with_max_tokens(10)
        .with_temperature(0.0)
}

#[tokio::test]
async fn provider_sends_chat_completions_body() {
    let (base, seen) = start_proxy().await;
    let provider = ProxyProvider::new(&config_for(format!("{base}/ok"))).unwrap();

    let response = provider.complete(ping()).await.unwrap();
    assert_eq!(
        response.content.as_deref(),
        Some("We can help with that. Share your details here.")
    );
    assert_eq!(response.finish_reason, FinishReason::Stop);

    let seen = seen.lock().unwrap();
    let body = seen.body.as_ref().expect("proxy saw no request");
    assert_eq!(body["model"], "llama-3.1-70b-versatile");
    assert_eq!(body["max_tokens"], 10);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Ping");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer test-key"));
}

#[tokio::test]
async fn provider_reports_http_failure_status() {
    let (base, _) = start_proxy().await;
    let provider = ProxyProvider::new(&config_for(format!("{base}/fail"))).unwrap();

    match provider.complete(ping()).await {
        Err(LlmError::RequestFailed { status, reason, .. }) => {
            assert_eq!(status, Some(500));
            assert!(reason.contains("upstream exploded"));
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_rejects_malformed_payload() {
    let (base, _) = start_proxy().await;
    let provider = ProxyProvider::new(&config_for(format!("{base}/garbage"))).unwrap();

    let err = provider.complete(ping()).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse { .. }));
    assert!(!err.is_permanent());
}

#[tokio::test]
async fn provider_reports_unreachable_proxy() {
    // Bind and drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let provider = ProxyProvider::new(&config_for(format!("http://127.0.0.1:{port}/ok"))).unwrap();
    let err = provider.complete(ping()).await.unwrap_err();
    assert!(matches!(err, LlmError::RequestFailed { status: None, .. }));
}

fn engine_for(url: String) -> IntakeEngine {
    let config = config_for(url);
    let llm: Arc<dyn LlmProvider> = Arc::new(ProxyProvider::new(&config).unwrap());
    IntakeEngine::new(llm, &config)
}

#[tokio::test]
async fn engine_uses_remote_reply_and_sends_context_prompt() {
    let (base, seen) = start_proxy().await;
    let engine = engine_for(format!("{base}/ok"));
    let mut state = ConversationState::new();

    let outcome = engine
        .process_turn(&mut state, "I need a mobile app, my name is Priya")
        .await;
    assert_eq!(outcome.source, ReplySource::Remote);
    assert_eq!(outcome.step, IntakeStep::InfoCollection);
    assert!(outcome.reply.starts_with("We can help"));

    let seen = seen.lock().unwrap();
    let body = seen.body.as_ref().unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("Conversation Step: info_collection"));
    assert!(system.contains("\"name\":\"Priya\""));
    assert_eq!(body["max_tokens"], 600);
}

#[tokio::test]
async fn engine_falls_back_when_proxy_fails() {
    let (base, _) = start_proxy().await;
    let engine = engine_for(format!("{base}/fail"));
    let mut state = ConversationState::new();

    let outcome = engine.process_turn(&mut state, "hello there").await;
    assert_eq!(outcome.source, ReplySource::StepFallback);
    assert!(outcome.reply.contains("What brings you here today?"));
}

#[tokio::test]
async fn engine_replaces_blank_reply_with_keyword_answer() {
    let (base, _) = start_proxy().await;
    let engine = engine_for(format!("{base}/blank"));
    let mut state = ConversationState::new();

    let outcome = engine
        .process_turn(&mut state, "what's your price range")
        .await;
    assert_eq!(outcome.source, ReplySource::Contextual);
    assert!(!outcome.reply.trim().is_empty());
}

#[tokio::test]
async fn check_connection_reflects_proxy_health() {
    let (base, _) = start_proxy().await;
    assert!(engine_for(format!("{base}/ok")).check_connection().await);
    assert!(!engine_for(format!("{base}/fail")).check_connection().await);
}
