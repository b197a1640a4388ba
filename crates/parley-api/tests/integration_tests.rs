//! Integration tests for the Parley API.
//!
//! Each test builds its own router over a fresh conversation store and drives
//! it in-process with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use parley_api::error::ErrorBody;
use parley_api::handlers::{
    ConversationListResponse, ConversationResponse, HealthResponse, ModelsResponse,
};
use parley_api::{create_router, AppState};
use parley_core::ParleyConfig;
use parley_llm::{
    CompletionRequest, CompletionResponse, CompletionService, LlmError, MockCompletionService,
};

// =============================================================================
// Helpers
// =============================================================================

/// Always fails, to exercise the external-call error path.
struct FailingService;

#[async_trait::async_trait]
impl CompletionService for FailingService {
    async fn complete(&self, _: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Response("upstream returned 500".to_string()))
    }

    fn provider(&self) -> &'static str {
        "failing"
    }
}

fn make_state() -> AppState {
    AppState::new(ParleyConfig::default(), Arc::new(MockCompletionService::new()))
}

fn make_app() -> axum::Router {
    create_router(make_state())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health and models
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let resp = make_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = body_json(resp).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.provider, "mock");
    assert_eq!(health.active_conversations, 0);
}

#[tokio::test]
async fn test_models() {
    let resp = make_app().oneshot(get("/models")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let models: ModelsResponse = body_json(resp).await;
    assert_eq!(models.default_model, "gpt-4o-mini");
    assert!(models.models.contains(&"gpt-4".to_string()));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let resp = make_app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "not_found");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_weather_with_session() {
    let resp = make_app()
        .oneshot(post_json(
            "/chat",
            &json!({
                "message": "what's the weather in Taipei",
                "metadata": {"session_id": "s1", "user_id": "u1"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_json(resp).await;
    assert_eq!(body["type"], "weather");
    assert!(body["message"].as_str().unwrap().contains("Taipei"));
    assert!(body["model_used"].is_null());
    assert_eq!(body["conversation_id"], "s1");
    assert_eq!(body["metadata"]["user_id"], "u1");
    assert_eq!(body["metadata"]["turn_count"], 2);
    assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_translation_without_session() {
    let resp = make_app()
        .oneshot(post_json("/chat", &json!({"message": "translate hello to French"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_json(resp).await;
    assert_eq!(body["type"], "translation");
    assert_eq!(body["message"], "bonjour");
    assert!(body["conversation_id"].is_null());
    assert!(body["metadata"]["user_id"]
        .as_str()
        .unwrap()
        .starts_with("anonymous_"));
}

#[tokio::test]
async fn test_chat_general_uses_requested_model() {
    let resp = make_app()
        .oneshot(post_json(
            "/chat",
            &json!({"message": "tell me a joke", "model": "gpt-4", "temperature": 0.3}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = body_json(resp).await;
    assert_eq!(body["type"], "general");
    assert_eq!(body["model_used"], "gpt-4");
    assert_eq!(body["metadata"]["temperature"], 0.3);
}

#[tokio::test]
async fn test_chat_validation_errors() {
    let app = make_app();
    let cases = [
        json!({"message": ""}),
        json!({"message": "   "}),
        json!({"message": "hi", "temperature": 2.5}),
        json!({"message": "hi", "model": "not-a-model"}),
        json!({"message": "hi", "metadata": {"session_id": 12}}),
    ];
    for case in cases {
        let resp = app.clone().oneshot(post_json("/chat", &case)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", case);
        let body: ErrorBody = body_json(resp).await;
        assert_eq!(body.kind, "validation");
        assert_eq!(body.error, "bad_request");
    }
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let app = make_app();

    let missing_message = app
        .clone()
        .oneshot(post_json("/chat", &json!({"model": "gpt-4"})))
        .await
        .unwrap();
    assert_eq!(missing_message.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = body_json(missing_message).await;
    assert_eq!(body.error, "invalid_body");
    assert_eq!(body.kind, "validation");

    let not_json = app
        .oneshot(
            Request::post("/chat")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_external_failure_is_502_and_keeps_history() {
    let state = AppState::new(ParleyConfig::default(), Arc::new(FailingService));
    let app = create_router(state.clone());

    // Weather never calls the completion service, so it still succeeds.
    let ok = app
        .clone()
        .oneshot(post_json(
            "/chat",
            &json!({"message": "weather in Paris", "metadata": {"session_id": "f"}}),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let failed = app
        .oneshot(post_json(
            "/chat",
            &json!({"message": "tell me a story", "metadata": {"session_id": "f"}}),
        ))
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
    let body: ErrorBody = body_json(failed).await;
    assert_eq!(body.kind, "external_call");

    assert_eq!(state.dispatcher.history("f").unwrap().len(), 2);
}

// =============================================================================
// Conversations
// =============================================================================

#[tokio::test]
async fn test_conversation_history_round_trip() {
    let app = make_app();
    for message in ["my name is Ming", "what is my name?"] {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/chat",
                &json!({"message": message, "metadata": {"session_id": "ming"}}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app.clone().oneshot(get("/conversations/ming")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let conversation: ConversationResponse = body_json(resp).await;
    assert_eq!(conversation.session_id, "ming");
    assert_eq!(conversation.turn_count, 4);
    assert_eq!(conversation.turns[0].content, "my name is Ming");
    assert_eq!(conversation.turns[2].content, "what is my name?");
    // The mock reports how many earlier user messages it was given.
    assert!(conversation.turns[3].content.contains("context: 1 earlier"));

    let resp = app.oneshot(get("/conversations")).await.unwrap();
    let list: ConversationListResponse = body_json(resp).await;
    assert_eq!(list.total, 1);
    assert_eq!(list.conversations[0].session_id, "ming");
    assert_eq!(list.conversations[0].turn_count, 4);
}

#[tokio::test]
async fn test_unseen_conversation_is_empty() {
    let resp = make_app()
        .oneshot(get("/conversations/never-seen"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let conversation: ConversationResponse = body_json(resp).await;
    assert!(conversation.turns.is_empty());
    assert_eq!(conversation.turn_count, 0);
}

#[tokio::test]
async fn test_sessions_do_not_share_history() {
    let app = make_app();
    for (session, message) in [("a", "hello"), ("b", "hi"), ("a", "again")] {
        app.clone()
            .oneshot(post_json(
                "/chat",
                &json!({"message": message, "metadata": {"session_id": session}}),
            ))
            .await
            .unwrap();
    }

    let resp = app.clone().oneshot(get("/conversations/a")).await.unwrap();
    let a: ConversationResponse = body_json(resp).await;
    let resp = app.oneshot(get("/conversations/b")).await.unwrap();
    let b: ConversationResponse = body_json(resp).await;
    assert_eq!(a.turn_count, 4);
    assert_eq!(b.turn_count, 2);
    assert_eq!(b.turns[0].content, "hi");
}
