use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use colloquy_bedrock::error::ProviderError;
use colloquy_bedrock::provider::{Completion, CompletionProvider, CompletionRequest};
use colloquy_core::models::usage::TokenCount;
use colloquy_core::persona::Persona;
use colloquy_rag::store::{ChunkStore, MemoryStore};
use colloquy_server::service::ServiceSettings;
use colloquy_server::state::AppState;

const BOUNDARY: &str = "colloquy-test-boundary";

enum Script {
    Reply(&'static str),
    TokenLimit,
    Fail,
    Hang,
}

/// Completion provider that follows a fixed script and records every call.
struct ScriptedProvider {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match &self.script {
            Script::Reply(text) => Ok(Completion {
                text: text.to_string(),
                usage: TokenCount { input: 12, output: 34 },
            }),
            Script::TokenLimit => Err(ProviderError::TokenLimit("input is too long".to_string())),
            Script::Fail => Err(ProviderError::Invocation("connection reset".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Invocation("unreachable".to_string()))
            }
        }
    }
}

struct Harness {
    app: Router,
    provider: Arc<ScriptedProvider>,
    store: Arc<MemoryStore>,
}

fn harness(script: Script) -> Harness {
    harness_with(script, ServiceSettings::default())
}

fn harness_with(script: Script, settings: ServiceSettings) -> Harness {
    let provider = ScriptedProvider::new(script);
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(provider.clone(), store.clone(), settings);
    Harness {
        app: colloquy_server::app(state),
        provider,
        store,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

struct Part<'a> {
    name: &'a str,
    file: Option<(&'a str, &'a str)>,
    data: &'a [u8],
}

fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        file: None,
        data: value.as_bytes(),
    }
}

fn file_part<'a>(file_name: &'a str, mime: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        file: Some((file_name, mime)),
        data,
    }
}

async fn post_multipart(app: &Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file {
            Some((file_name, mime)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: {mime}\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn prompt_returns_chat_response() {
    let h = harness(Script::Reply("Quicksort partitions around a pivot."));

    let (status, body) = post_json(
        &h.app,
        "/chat/prompt",
        json!({"message": "Explain quicksort", "userId": "u1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["content"], "Quicksort partitions around a pivot.");
    assert_eq!(body["message"], "Explain quicksort");
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["error"], Value::Null);

    let conversation_id = body["conversationId"].as_str().unwrap();
    let message_id = body["messageId"].as_str().unwrap();
    assert_eq!(conversation_id.len(), 36);
    assert_eq!(message_id.len(), 36);
    assert_ne!(conversation_id, message_id);

    assert_eq!(h.provider.calls(), 1);
    let sent = h.provider.last_request();
    assert_eq!(sent.system, Persona::CodeAssistant.system_prompt());
    assert_eq!(sent.user, "Explain quicksort");
}

#[tokio::test]
async fn api_prefix_serves_the_same_routes() {
    let h = harness(Script::Reply("ok"));

    let (status, body) = post_json(
        &h.app,
        "/api/chat/prompt",
        json!({"message": "hi", "userId": "u1", "conversationId": "conv-42"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], "conv-42");
}

#[tokio::test]
async fn message_ids_are_fresh_per_response() {
    let h = harness(Script::Reply("ok"));
    let request = json!({"message": "hi", "conversationId": "c1"});

    let (_, first) = post_json(&h.app, "/chat/prompt", request.clone()).await;
    let (_, second) = post_json(&h.app, "/chat/prompt", request).await;

    assert_eq!(first["conversationId"], second["conversationId"]);
    assert_ne!(first["messageId"], second["messageId"]);
}

#[tokio::test]
async fn blank_message_is_rejected_without_calling_the_model() {
    let h = harness(Script::Reply("unused"));

    for body in [
        json!({"message": "", "userId": "u1"}),
        json!({"message": "   \n\t", "userId": "u1"}),
        json!({"userId": "u1"}),
    ] {
        let (status, envelope) = post_json(&h.app, "/chat/prompt", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope["code"], "INVALID_MESSAGE");
        assert_eq!(envelope["message"], "Message wasn't valid or was empty");
        assert!(envelope["timestamp"].as_i64().unwrap() > 0);
    }

    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn oversized_message_is_rejected() {
    let h = harness(Script::Reply("unused"));
    let (status, envelope) =
        post_json(&h.app, "/chat/prompt", json!({"message": "a".repeat(10_000)})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "INVALID_MESSAGE");
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_invalid_message() {
    let h = harness(Script::Reply("unused"));
    let request = Request::builder()
        .method("POST")
        .uri("/chat/prompt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();

    let (status, bytes) = send(&h.app, request).await;
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "INVALID_MESSAGE");
    assert!(envelope["details"].is_string());
}

#[tokio::test]
async fn provider_categories_survive_to_the_envelope() {
    let h = harness(Script::TokenLimit);
    let (status, envelope) = post_json(&h.app, "/chat/prompt", json!({"message": "long"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "TOKEN_LIMIT");
    assert_eq!(envelope["message"], "Reached the maximum amount of tokens");
}

#[tokio::test]
async fn generic_provider_failure_is_llm_error() {
    let h = harness(Script::Fail);
    let (status, envelope) = post_json(&h.app, "/chat/agent", json!({"message": "hi"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "LLM_ERROR");
    assert_eq!(envelope["message"], "Couldn't get a precise answer from LLM");
    assert!(envelope["details"].as_str().unwrap().contains("connection reset"));
    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let settings = ServiceSettings {
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    };
    let h = harness_with(Script::Hang, settings);

    let (status, envelope) = post_json(&h.app, "/chat/prompt", json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "TIMED_OUT");
    assert_eq!(envelope["message"], "Chat response timed out");
}

#[tokio::test]
async fn agent_routes_use_agent_templates() {
    let h = harness(Script::Reply("done"));

    let (status, body) = post_json(&h.app, "/api/agent/request", json!({"message": "audit deps"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "done");
    let sent = h.provider.last_request();
    assert_eq!(sent.system, Persona::Agent.system_prompt());
    assert_eq!(sent.user, "audit deps");

    let (status, _) = post_json(&h.app, "/api/agent/plan", json!({"message": "migrate the database"})).await;
    assert_eq!(status, StatusCode::OK);
    let sent = h.provider.last_request();
    assert!(sent.user.contains("step-by-step plan"));
    assert!(sent.user.contains("migrate the database"));
    assert_eq!(h.provider.calls(), 2);
}

#[tokio::test]
async fn plan_failure_has_its_own_message() {
    let h = harness(Script::Fail);
    let (status, envelope) = post_json(&h.app, "/api/agent/plan", json!({"message": "deploy"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "LLM_ERROR");
    assert_eq!(envelope["message"], "Failed to create operation plan");
}

#[tokio::test]
async fn prompt_with_file_answers_from_the_document() {
    let h = harness(Script::Reply("It picks a pivot."));
    let document = b"Quicksort chooses a pivot element and partitions the array around it.";

    let (status, body) = post_multipart(
        &h.app,
        "/api/chat/prompt-with-file?userId=u1&conversationId=conv-9",
        &[
            text_part("message", "How does quicksort choose a pivot?"),
            file_part("notes.txt", "text/plain", document),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["content"], "It picks a pivot.");
    assert_eq!(body["conversationId"], "conv-9");
    assert_eq!(body["userId"], "u1");

    let sent = h.provider.last_request();
    assert!(sent.user.contains("CONTEXT:"));
    assert!(sent.user.contains("Quicksort chooses a pivot element"));
    assert!(sent.user.contains("QUESTION:\nHow does quicksort choose a pivot?"));

    let chunks = h.store.chunks().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].conversation_id, "conv-9");
    assert_eq!(chunks[0].user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn same_file_in_same_conversation_is_stored_once() {
    let h = harness(Script::Reply("ok"));
    let document = b"Binary search halves the interval each step.";
    let parts = [
        text_part("message", "What does binary search do?"),
        text_part("conversationId", "c1"),
        file_part("search.txt", "text/plain", document),
    ];

    let (first, _) = post_multipart(&h.app, "/chat/prompt-with-file", &parts).await;
    let (second, _) = post_multipart(&h.app, "/chat/prompt-with-file", &parts).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(h.store.insert_count(), 1);

    let (third, _) = post_multipart(
        &h.app,
        "/chat/prompt-with-file?conversationId=c2",
        &[
            text_part("message", "What does binary search do?"),
            file_part("search.txt", "text/plain", document),
        ],
    )
    .await;
    assert_eq!(third, StatusCode::OK);
    assert_eq!(h.store.insert_count(), 2);
    assert_eq!(h.provider.calls(), 3);
}

#[tokio::test]
async fn fifty_megabyte_upload_is_rejected_before_ingestion() {
    let h = harness(Script::Reply("unused"));
    let huge = vec![b'a'; 50 * 1024 * 1024];

    let (status, body) = post_multipart(
        &h.app,
        "/chat/prompt-with-file",
        &[
            text_part("message", "Summarize"),
            text_part("userId", "u1"),
            file_part("big.txt", "text/plain", &huge),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["userId"], "u1");
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("FILE_PROCESSING_ERROR"));
    assert!(error.contains("File size exceeds maximum allowed size of 10MB"));

    assert!(h.store.is_empty().await.unwrap());
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn oversized_file_sent_before_the_message_is_a_size_error() {
    let h = harness(Script::Reply("unused"));
    let big = vec![b'a'; 11 * 1024 * 1024];

    let (status, body) = post_multipart(
        &h.app,
        "/chat/prompt-with-file",
        &[
            file_part("big.txt", "text/plain", &big),
            text_part("message", "Summarize"),
            text_part("userId", "u1"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["message"], "Summarize");
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("File size exceeds maximum allowed size of 10MB"), "{error}");

    assert!(h.store.is_empty().await.unwrap());
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn failed_upload_reports_the_conversation_it_was_stored_under() {
    let h = harness(Script::Fail);

    let (status, body) = post_multipart(
        &h.app,
        "/chat/prompt-with-file",
        &[
            text_part("message", "What does the log say?"),
            file_part("app.log", "text/plain", b"The log says the cache warmed up."),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("RAG_ERROR"));

    let chunks = h.store.chunks().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(body["conversationId"], chunks[0].conversation_id.as_str());
}

#[tokio::test]
async fn non_multipart_upload_gets_an_error_envelope() {
    let h = harness(Script::Reply("unused"));

    let (status, envelope) = post_json(
        &h.app,
        "/chat/prompt-with-file",
        json!({"message": "no multipart here"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "INVALID_MESSAGE");
    assert!(envelope["details"].is_string());
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn unsupported_file_type_is_rejected() {
    let h = harness(Script::Reply("unused"));

    let (status, body) = post_multipart(
        &h.app,
        "/chat/prompt-with-file",
        &[
            text_part("message", "What is in this image?"),
            file_part("cat.png", "image/png", b"\x89PNG\r\n"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("File type not supported. Allowed types: PDF, TXT, JSON, XML")
    );
    assert!(h.store.is_empty().await.unwrap());
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn upload_without_file_field_is_bad_input() {
    let h = harness(Script::Reply("unused"));

    let (status, envelope) = post_multipart(
        &h.app,
        "/chat/prompt-with-file",
        &[text_part("message", "no attachment")],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope["code"], "INVALID_MESSAGE");
}

#[tokio::test]
async fn new_conversation_returns_chat_id() {
    let h = harness(Script::Reply("unused"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/new")
        .body(Body::empty())
        .unwrap();

    let (status, bytes) = send(&h.app, request).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chatId"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn health_endpoints() {
    let h = harness(Script::Reply("unused"));

    for (uri, expected) in [
        ("/chat/health", "Chat service is healthy"),
        ("/api/chat/health", "Chat service is healthy"),
        ("/api/agent/health", "Agent service is operational"),
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, bytes) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let h = harness(Script::Reply("unused"));
    let request = Request::builder()
        .uri("/chat/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
