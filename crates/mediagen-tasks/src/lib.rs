#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod normalize;
mod poller;
mod provider;
mod server;
mod store;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use mediagen_core::RequestContext;
use secrecy::SecretString;

pub use error::{ErrorCode, Result, TaskGenError};
pub use poller::PollPolicy;
pub use server::{GenServerBuilder, Server};
pub use store::{PersistedTask, TaskStore};
pub use types::{GenerationRequest, GenerationResult, Modality, TaskHandle, TaskState, TaskStatus, Usage};

/// Build the generation server from configuration
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &mediagen_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        GenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for generation tasks
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/v1/generations", post(submit))
        .route("/v1/generations/{provider}/{task_id}", get(status))
}

/// Handle task submission requests
async fn submit(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<TaskHandle>)> {
    tracing::debug!("Generation submission handler called for model: {}", request.model);

    let context = request_context(&headers);
    let handle = server.submit(&request, &context).await?;

    tracing::debug!(task_id = %handle.task_id, "generation task accepted");

    Ok((StatusCode::ACCEPTED, Json(handle)))
}

/// Handle single status checks; the client drives its own poll cadence
async fn status(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    Path((provider, task_id)): Path<(String, String)>,
) -> Result<Json<TaskStatus>> {
    let context = request_context(&headers);
    let status = server.poll_task(&provider, &task_id, &context).await?;

    Ok(Json(status))
}

/// Build a request context from inbound headers
///
/// A bearer token on the inbound request overrides the configured provider key
fn request_context(headers: &HeaderMap) -> RequestContext {
    let mut context = RequestContext::empty();

    context.api_key = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| SecretString::from(token.to_owned()));

    context
}
