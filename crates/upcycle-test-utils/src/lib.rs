//! Shared test utilities for upcycle integration tests.
//!
//! Two kinds of stand-in for the Gemini API:
//! - [`ScriptedModel`]: an in-process [`VisionModel`] that replays canned
//!   replies and records every call.
//! - [`MockGemini`]: a local axum server speaking the `generateContent`
//!   wire format, for exercising the real HTTP client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::Instant;

use upcycle_core::model::{ImageFormat, ImagePayload, ModelError, VisionModel};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Smallest byte string recognised as a PNG.
pub fn sample_png() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D]
}

/// Smallest byte string recognised as a JPEG.
pub fn sample_jpeg() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
}

pub fn sample_image() -> ImagePayload {
    ImagePayload::new(ImageFormat::Jpeg, sample_jpeg())
}

/// A well-formed step record as the model would emit it.
pub fn step_json(step_number: i64, title: &str) -> Value {
    json!({
        "step_number": step_number,
        "title": title,
        "description": format!("Do the {title} part carefully."),
        "estimated_time": "30 minutes",
        "materials_needed": ["gloves", "sandpaper"]
    })
}

/// Compact JSON array text of well-formed steps with the given titles,
/// numbered from 1.
pub fn steps_array_text(titles: &[&str]) -> String {
    let steps: Vec<Value> = titles
        .iter()
        .zip(1..)
        .map(|(title, n)| step_json(n, title))
        .collect();
    Value::Array(steps).to_string()
}

/// A `generateContent` response body whose first candidate carries `text`.
pub fn gemini_text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

enum Script {
    Queue(VecDeque<Result<String, ModelError>>),
    Always(Result<String, ModelError>),
}

/// In-process [`VisionModel`] with canned replies.
///
/// Call times are taken from `tokio::time::Instant`, so under a paused
/// runtime they reflect the virtual clock.
pub struct ScriptedModel {
    name: String,
    script: Mutex<Script>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Reply with each entry in order. Once exhausted, every call fails
    /// with a transport error.
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Self::with_script(Script::Queue(replies.into()))
    }

    /// Reply with the same result on every call.
    pub fn always(reply: Result<String, ModelError>) -> Arc<Self> {
        Self::with_script(Script::Always(reply))
    }

    fn with_script(script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: "scripted".to_string(),
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.call_times()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, _image: &ImagePayload) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &mut *self.script.lock().unwrap() {
            Script::Queue(replies) => replies
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::Transport("script exhausted".to_string()))),
            Script::Always(reply) => reply.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// MockGemini
// ---------------------------------------------------------------------------

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path segment after `/v1beta/models/`, e.g. `gemini-1.5-flash:generateContent`.
    pub model_action: String,
    pub api_key: Option<String>,
    pub body: Value,
}

struct MockState {
    replies: Mutex<VecDeque<(u16, Value)>>,
    delay: Duration,
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A running mock of the Gemini REST API on `127.0.0.1`.
///
/// Replies are served in order; once exhausted, every request gets a 500.
/// The server task ends with the test runtime.
pub struct MockGemini {
    base_url: String,
    state: Arc<MockState>,
}

impl MockGemini {
    pub async fn start(replies: Vec<(u16, Value)>) -> Self {
        Self::start_with_delay(replies, Duration::ZERO).await
    }

    /// Like [`start`](Self::start), but every reply waits `delay` first.
    pub async fn start_with_delay(replies: Vec<(u16, Value)>, delay: Duration) -> Self {
        let state = Arc::new(MockState {
            replies: Mutex::new(replies.into()),
            delay,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{model_action}", post(generate_content))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock Gemini listener");
        let addr = listener
            .local_addr()
            .expect("failed to read mock Gemini address");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Base URL to hand to `GeminiConfig::with_base_url`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

async fn generate_content(
    State(state): State<Arc<MockState>>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        model_action,
        api_key,
        body,
    });

    let reply = state.replies.lock().unwrap().pop_front();

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    match reply {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "code": 500, "message": "mock replies exhausted" } })),
        ),
    }
}
