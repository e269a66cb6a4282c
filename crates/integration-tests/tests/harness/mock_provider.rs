//! Mock generation backend for integration tests
//!
//! Implements a minimal `DashScope`-compatible task API: wildcard POST for
//! synthesis submissions and GET /tasks/{id} for status checks, with atomic
//! request counters and a scripted status sequence.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Task id handed out by every accepted submission
pub const TASK_ID: &str = "task-abc123";

/// One scripted response for a status check
#[derive(Debug, Clone)]
pub enum ScriptedStatus {
    /// A JSON status body
    Body(Value),
    /// An HTTP error with no usable body
    Error(u16),
}

/// A still-running status body
pub fn pending() -> ScriptedStatus {
    ScriptedStatus::Body(json!({
        "request_id": "req-1",
        "output": { "task_id": TASK_ID, "task_status": "RUNNING" },
    }))
}

/// A terminal success body with a result URL in the results array
pub fn succeeded(url: &str) -> ScriptedStatus {
    ScriptedStatus::Body(json!({
        "request_id": "req-1",
        "output": { "task_id": TASK_ID, "task_status": "SUCCEEDED", "results": [{ "url": url }] },
        "usage": { "image_count": 1 },
    }))
}

/// A malformed terminal success: sentinel present, no result reference
pub fn succeeded_without_result() -> ScriptedStatus {
    ScriptedStatus::Body(json!({
        "request_id": "req-1",
        "output": { "task_id": TASK_ID, "task_status": "SUCCEEDED" },
    }))
}

/// A provider-declared failure body
pub fn failed(message: &str) -> ScriptedStatus {
    ScriptedStatus::Body(json!({
        "request_id": "req-1",
        "output": { "task_id": TASK_ID, "task_status": "FAILED", "message": message },
    }))
}

/// A transient HTTP error on the status endpoint
pub fn http_error(code: u16) -> ScriptedStatus {
    ScriptedStatus::Error(code)
}

/// Knobs for a mock provider instance
pub struct MockProviderOptions {
    /// Status bodies returned in order; the final entry repeats
    pub statuses: Vec<ScriptedStatus>,
    /// When set, submissions for models outside the list are rejected with
    /// a "Model not exist" error
    pub allowed_models: Option<Vec<String>>,
    /// When set, every submission is rejected with this (status, message)
    pub reject: Option<(u16, String)>,
    /// When set, 2xx submission responses omit the task id
    pub omit_task_id: bool,
}

impl Default for MockProviderOptions {
    fn default() -> Self {
        Self {
            statuses: vec![succeeded("https://cdn.example/out.png")],
            allowed_models: None,
            reject: None,
            omit_task_id: false,
        }
    }
}

/// Mock generation backend that returns predictable responses
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockProviderState>,
}

struct MockProviderState {
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    async_header_count: AtomicU32,
    submissions: Mutex<Vec<Value>>,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    allowed_models: Option<Vec<String>>,
    reject: Option<(u16, String)>,
    omit_task_id: bool,
}

impl MockProvider {
    /// Start a mock that accepts submissions and succeeds immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockProviderOptions::default()).await
    }

    /// Start a mock with a scripted status sequence
    pub async fn start_with_statuses(statuses: Vec<ScriptedStatus>) -> anyhow::Result<Self> {
        Self::start_with(MockProviderOptions {
            statuses,
            ..MockProviderOptions::default()
        })
        .await
    }

    /// Start a mock with full options
    pub async fn start_with(options: MockProviderOptions) -> anyhow::Result<Self> {
        let state = Arc::new(MockProviderState {
            submit_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            async_header_count: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
            statuses: Mutex::new(options.statuses.into()),
            allowed_models: options.allowed_models,
            reject: options.reject,
            omit_task_id: options.omit_task_id,
        });

        let app = Router::new()
            .route("/tasks/{task_id}", routing::get(handle_status))
            .route("/{*path}", routing::post(handle_submit))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of submission requests received
    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::Relaxed)
    }

    /// Number of status checks received
    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::Relaxed)
    }

    /// Number of submissions carrying the async-mode header
    pub fn async_header_count(&self) -> u32 {
        self.state.async_header_count.load(Ordering::Relaxed)
    }

    /// Payloads of all received submissions, in order
    pub fn submissions(&self) -> Vec<Value> {
        self.state.submissions.lock().expect("submissions lock").clone()
    }

    /// Model names of all received submissions, in order
    pub fn submitted_models(&self) -> Vec<String> {
        self.submissions()
            .iter()
            .filter_map(|payload| payload.get("model").and_then(Value::as_str).map(str::to_owned))
            .collect()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_submit(
    State(state): State<Arc<MockProviderState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    state.submit_count.fetch_add(1, Ordering::Relaxed);

    if headers
        .get("x-dashscope-async")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("enable"))
    {
        state.async_header_count.fetch_add(1, Ordering::Relaxed);
    }

    state.submissions.lock().expect("submissions lock").push(payload.clone());

    if let Some((code, message)) = &state.reject {
        let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(json!({ "code": "Rejected", "message": message }))).into_response();
    }

    if let Some(allowed) = &state.allowed_models {
        let model = payload.get("model").and_then(Value::as_str).unwrap_or_default();
        if !allowed.iter().any(|m| m == model) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "code": "InvalidParameter",
                    "message": format!("Model not exist: {model}"),
                })),
            )
                .into_response();
        }
    }

    if state.omit_task_id {
        return Json(json!({ "request_id": "req-1", "output": {} })).into_response();
    }

    Json(json!({
        "request_id": "req-1",
        "output": { "task_id": TASK_ID, "task_status": "PENDING" },
    }))
    .into_response()
}

async fn handle_status(
    State(state): State<Arc<MockProviderState>>,
    Path(_task_id): Path<String>,
) -> impl IntoResponse {
    state.poll_count.fetch_add(1, Ordering::Relaxed);

    let scripted = {
        let mut statuses = state.statuses.lock().expect("statuses lock");
        if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        }
    };

    match scripted {
        Some(ScriptedStatus::Body(body)) => Json(body).into_response(),
        Some(ScriptedStatus::Error(code)) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "mock status error").into_response()
        }
        None => (StatusCode::NOT_FOUND, "no scripted status").into_response(),
    }
}
