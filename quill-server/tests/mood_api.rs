use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use quill_config::{Config, ConfigLoader, EnvConfig};
use quill_core::error::{ReflectionError, Result as ReflectionResult};
use quill_core::reflection::{
    CompletionProvider, CompletionRequest, FALLBACK_SUMMARY,
};
use quill_server::{AppState, create_app};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Captures the requests a fake provider receives.
#[derive(Default)]
struct Recorder(Mutex<Vec<CompletionRequest>>);

impl Recorder {
    fn push(&self, request: CompletionRequest) {
        self.0.lock().expect("recorder lock").push(request);
    }

    fn take(&self) -> Vec<CompletionRequest> {
        std::mem::take(&mut *self.0.lock().expect("recorder lock"))
    }
}

enum Reply {
    Text(&'static str),
    Nothing,
    Fail,
}

struct FakeProvider {
    reply: Reply,
    seen: Arc<Recorder>,
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> ReflectionResult<Option<String>> {
        self.seen.push(request);
        match self.reply {
            Reply::Text(text) => Ok(Some(text.to_string())),
            Reply::Nothing => Ok(None),
            Reply::Fail => Err(ReflectionError::Upstream {
                status: 503,
                body: "overloaded".into(),
            }),
        }
    }
}

fn config(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new()
        .load_from_env(EnvConfig::from_lookup(|name| vars.get(name).cloned()))
        .expect("valid config")
        .config
}

fn app(reply: Reply) -> (Router, Arc<Recorder>) {
    let seen = Arc::new(Recorder::default());
    let provider = FakeProvider {
        reply,
        seen: seen.clone(),
    };
    let state = AppState::new(
        config(&[("GROQ_API_KEY", "test-key")]),
        Arc::new(provider),
    );
    (create_app(state), seen)
}

async fn post_mood(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/analyze-mood")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn returns_the_trimmed_completion_with_a_neutral_mood() {
    let (app, seen) = app(Reply::Text("  You sound tired but hopeful.  \n"));

    let (status, body) = post_mood(
        app,
        json!({ "content": "Long day, but the sunset was nice." }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "summary": "You sound tired but hopeful.", "mood": "neutral" })
    );

    let requests = seen.take();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "openai/gpt-oss-20b");
    assert_eq!(requests[0].max_tokens, 120);
    assert!(
        requests[0].messages[1]
            .content
            .contains("Long day, but the sunset was nice.")
    );
}

#[tokio::test]
async fn rejects_missing_or_non_string_content() {
    for payload in [
        json!({}),
        json!({ "content": 42 }),
        json!({ "content": null }),
        json!({ "content": "" }),
    ] {
        let (app, seen) = app(Reply::Text("unused"));
        let (status, body) = post_mood(app, payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(
            body,
            json!({ "error": "Content is required and must be a string" })
        );
        assert!(seen.take().is_empty());
    }
}

#[tokio::test]
async fn upstream_failures_fall_back_to_the_canned_reply() {
    for reply in [Reply::Fail, Reply::Nothing, Reply::Text("   ")] {
        let (app, _) = app(reply);
        let (status, body) =
            post_mood(app, json!({ "content": "hello" }).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "summary": FALLBACK_SUMMARY, "mood": "neutral" }));
    }
}

#[tokio::test]
async fn unparseable_bodies_fall_back_too() {
    let (app, seen) = app(Reply::Text("unused"));
    let (status, body) = post_mood(app, "{not json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], FALLBACK_SUMMARY);
    assert!(seen.take().is_empty());
}

#[tokio::test]
async fn missing_api_key_still_answers_with_the_fallback() {
    let state = AppState::from_config(config(&[])).expect("state");
    assert!(!state.provider_configured);

    let (status, body) =
        post_mood(create_app(state), json!({ "content": "hi" }).to_string())
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], FALLBACK_SUMMARY);
}

#[tokio::test]
async fn health_reports_provider_configuration() {
    let (app, _) = app(Reply::Text("unused"));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider_configured"], true);
}

#[tokio::test]
async fn cors_allows_configured_origins() {
    let state = AppState::new(
        config(&[("CORS_ALLOWED_ORIGINS", "https://quill.example")]),
        Arc::new(FakeProvider {
            reply: Reply::Text("unused"),
            seen: Arc::new(Recorder::default()),
        }),
    );

    let response = create_app(state)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/analyze-mood")
                .header(header::ORIGIN, "https://quill.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("https://quill.example")
    );
}

#[tokio::test]
async fn ping_answers_without_touching_the_provider() {
    let (app, seen) = app(Reply::Fail);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/ping")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(seen.take().is_empty());
}
