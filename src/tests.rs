//! Integration tests for the minutes backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::UNEXPECTED_ERROR_MESSAGE;
use crate::llm::{Completion, CompletionRequest, LanguageModel, LlmError, TokenUsage};
use crate::minutes::MinutesService;
use crate::{create_router, AppState};

const SAMPLE_NOTES: &str = "Meeting on Q4 Audit Planning - January 15, 2026\n\n\
Present: Sarah Chen (Head of Audit), Jean-Pierre Dubois (Senior Auditor), Li Wei (Data Analytics Lead)\n\n\
Sarah opened by reviewing the Q3 audit findings. Jean-Pierre volunteered to draft a proposal for \
automated checks by January 22nd. Sarah agreed this should be high priority.\n\n\
Next meeting: January 22, 2026 at 3pm HKT.";

const SAMPLE_REPLY: &str = r#"```json
{
  "title": "Q4 Audit Planning",
  "date": "January 15, 2026",
  "attendees": ["Sarah Chen", "Jean-Pierre Dubois", "Li Wei"],
  "topics_discussed": [
    {
      "topic": "Q3 audit findings",
      "summary": "Sarah reviewed the Q3 findings. Automated checks were proposed.",
      "decisions": ["Automated checks are high priority"]
    }
  ],
  "action_items": [
    {
      "task": "Draft automated checks proposal",
      "assignee": "Jean-Pierre Dubois",
      "deadline": "January 22",
      "priority": "high"
    }
  ],
  "next_meeting": "January 22, 2026 at 3pm HKT"
}
```"#;

/// What the scripted model answers with.
enum Reply {
    Text(&'static str),
    Fail(fn() -> LlmError),
}

/// Language model double that replays a fixed reply and counts calls.
struct ScriptedModel {
    reply: Reply,
    calls: AtomicU32,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(Completion {
                content: text.to_string(),
                usage: TokenUsage::default(),
            }),
            Reply::Fail(make_error) => Err(make_error()),
        }
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    model: Arc<ScriptedModel>,
}

impl TestFixture {
    async fn new(reply: Reply) -> Self {
        Self::with_config(reply, Config::default()).await
    }

    async fn with_config(reply: Reply, config: Config) -> Self {
        let model = Arc::new(ScriptedModel {
            reply,
            calls: AtomicU32::new(0),
        });

        let state = AppState {
            minutes: Arc::new(MinutesService::new(model.clone())),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestFixture {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            model,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn model_calls(&self) -> u32 {
        self.model.calls.load(Ordering::SeqCst)
    }

    async fn post_notes(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/generate-minutes"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "1.0.0");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_reports_configured_version() {
    let config = Config {
        app_version: "2.3.4".to_string(),
        ..Config::default()
    };
    let fixture = TestFixture::with_config(Reply::Text(SAMPLE_REPLY), config).await;

    let body: Value = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["version"], "2.3.4");
}

#[tokio::test]
async fn test_generate_minutes() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture
        .post_notes(json!({ "raw_notes": SAMPLE_NOTES, "language": "en" }))
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let minutes = &body["minutes"];
    assert_eq!(minutes["title"], "Q4 Audit Planning");
    assert_eq!(minutes["attendees"].as_array().unwrap().len(), 3);
    assert_eq!(minutes["topics_discussed"][0]["topic"], "Q3 audit findings");
    assert_eq!(minutes["action_items"][0]["assignee"], "Jean-Pierre Dubois");
    assert_eq!(minutes["action_items"][0]["priority"], "high");
    assert_eq!(minutes["next_meeting"], "January 22, 2026 at 3pm HKT");

    assert_eq!(body["model_used"], "scripted-model");
    assert_eq!(
        body["input_character_count"],
        SAMPLE_NOTES.chars().count() as u64
    );
    assert!(body["processing_time_ms"].as_f64().unwrap() >= 0.0);
    assert!(body["generated_at"].is_string());
    assert_eq!(fixture.model_calls(), 1);
}

#[tokio::test]
async fn test_rejects_empty_notes() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture.post_notes(json!({ "raw_notes": "" })).await;
    assert_eq!(resp.status(), 422);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(fixture.model_calls(), 0);
}

#[tokio::test]
async fn test_rejects_too_short_notes() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture.post_notes(json!({ "raw_notes": "Short text" })).await;
    assert_eq!(resp.status(), 422);
    assert_eq!(fixture.model_calls(), 0);
}

#[tokio::test]
async fn test_rejects_too_long_notes() {
    let config = Config {
        max_input_length: 100,
        ..Config::default()
    };
    let fixture = TestFixture::with_config(Reply::Text(SAMPLE_REPLY), config).await;

    let resp = fixture
        .post_notes(json!({ "raw_notes": "a".repeat(101) }))
        .await;
    assert_eq!(resp.status(), 422);
    assert_eq!(fixture.model_calls(), 0);
}

#[tokio::test]
async fn test_rejects_missing_field() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture.post_notes(json!({})).await;
    assert_eq!(resp.status(), 422);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rejects_malformed_json_body() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture
        .client
        .post(fixture.url("/generate-minutes"))
        .header("content-type", "application/json")
        .body("{\"raw_notes\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn test_invalid_ai_json_is_unprocessable() {
    let fixture = TestFixture::new(Reply::Text("Sure! Here are your minutes.")).await;

    let resp = fixture.post_notes(json!({ "raw_notes": SAMPLE_NOTES })).await;
    assert_eq!(resp.status(), 422);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_AI_RESPONSE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("AI returned invalid JSON"));
}

#[tokio::test]
async fn test_provider_failure_is_internal_error() {
    let fixture = TestFixture::new(Reply::Fail(|| LlmError::Connection(
        "connection refused".to_string(),
    )))
    .await;

    let resp = fixture.post_notes(json!({ "raw_notes": SAMPLE_NOTES })).await;
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], UNEXPECTED_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_psk_protects_generation_only() {
    let config = Config {
        api_psk: Some("secret-key".to_string()),
        ..Config::default()
    };
    let fixture = TestFixture::with_config(Reply::Text(SAMPLE_REPLY), config).await;

    // Health stays open
    let health = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);

    let unauthorized = fixture.post_notes(json!({ "raw_notes": SAMPLE_NOTES })).await;
    assert_eq!(unauthorized.status(), 401);
    let body: Value = unauthorized.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let authorized = fixture
        .client
        .post(fixture.url("/generate-minutes"))
        .header("x-api-key", "secret-key")
        .json(&json!({ "raw_notes": SAMPLE_NOTES }))
        .send()
        .await
        .unwrap();
    assert_eq!(authorized.status(), 200);
    assert_eq!(fixture.model_calls(), 1);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let fixture = TestFixture::new(Reply::Text(SAMPLE_REPLY)).await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .header("origin", "https://minutes.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
