use async_trait::async_trait;
use jiff::Timestamp;
use mediagen_config::FallbackTarget;
use mediagen_core::RequestContext;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GenerationProvider;
use crate::{
    error::{ErrorCode, Result, TaskGenError},
    normalize,
    types::{GenerationRequest, Modality, TaskHandle, TaskStatus, Usage},
};

/// Default `DashScope` API base URL
const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";

/// Synthesis endpoint paths by modality
const IMAGE_SYNTHESIS_PATH: &str = "/services/aigc/text2image/image-synthesis";
const VIDEO_SYNTHESIS_PATH: &str = "/services/aigc/video-generation/video-synthesis";

/// Header that switches the synthesis endpoint into task mode
const ASYNC_HEADER: &str = "X-DashScope-Async";

/// Static style selector to prompt-prefix mapping
///
/// Unmapped styles pass the prompt through unchanged.
const STYLE_PREFIXES: &[(&str, &str)] = &[
    ("anime", "anime style, vibrant colors, "),
    ("oil_painting", "oil painting style, visible brushstrokes, "),
    ("watercolor", "watercolor style, soft washes, "),
    ("sketch", "pencil sketch style, monochrome line art, "),
    ("3d_cartoon", "3D cartoon style, soft studio lighting, "),
    ("realistic", "photorealistic, fine detail, "),
];

/// `DashScope`-style asynchronous generation provider
pub(crate) struct DashscopeProvider {
    name: String,
    client: Client,
    api_key: SecretString,
    base_url: String,
    image_sizes: Vec<String>,
    video_resolutions: Vec<String>,
    fallbacks: Vec<FallbackTarget>,
}

impl DashscopeProvider {
    pub fn new(
        name: String,
        api_key: SecretString,
        base_url: Option<String>,
        image_sizes: Vec<String>,
        video_resolutions: Vec<String>,
        fallbacks: Vec<FallbackTarget>,
    ) -> Self {
        let base_url = base_url.map_or_else(|| DEFAULT_BASE_URL.to_string(), |url| url.trim_end_matches('/').to_string());

        Self {
            name,
            client: Client::new(),
            api_key,
            base_url,
            image_sizes,
            video_resolutions,
            fallbacks,
        }
    }

    /// Strip the "provider/" prefix from a model name
    ///
    /// Model names arrive as "tongyi/wanx-v1"; the upstream API expects
    /// just "wanx-v1"
    fn strip_model_prefix(model: &str) -> &str {
        model.split_once('/').map_or(model, |(_, model_name)| model_name)
    }

    /// Reject bad requests before any network call
    fn validate(&self, request: &GenerationRequest) -> Result<()> {
        if request.prompt.trim().is_empty() {
            return Err(TaskGenError::InvalidRequest("prompt must not be empty".to_string()));
        }

        let supported = match request.modality {
            Modality::Image => &self.image_sizes,
            Modality::Video => &self.video_resolutions,
        };

        if !supported.contains(&request.size) {
            return Err(TaskGenError::InvalidRequest(format!(
                "unsupported {} size '{}', expected one of: {}",
                request.modality,
                request.size,
                supported.join(", ")
            )));
        }

        Ok(())
    }

    /// Submission targets in trial order: the requested model first, then
    /// the configured fallback sequence with an identical payload shape
    fn submission_targets(&self, request: &GenerationRequest) -> Vec<(String, String)> {
        let default_path = match request.modality {
            Modality::Image => IMAGE_SYNTHESIS_PATH,
            Modality::Video => VIDEO_SYNTHESIS_PATH,
        };

        let mut targets = vec![(
            Self::strip_model_prefix(&request.model).to_string(),
            default_path.to_string(),
        )];

        for fallback in &self.fallbacks {
            let path = fallback.endpoint.clone().unwrap_or_else(|| default_path.to_string());
            targets.push((fallback.model.clone(), path));
        }

        targets
    }

    fn bearer_token<'a>(&'a self, context: &'a RequestContext) -> &'a str {
        context.api_key.as_ref().unwrap_or(&self.api_key).expose_secret()
    }

    /// One submission attempt against a single (model, endpoint) pair
    async fn attempt_submit(
        &self,
        model: &str,
        path: &str,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> Result<TaskHandle> {
        let url = format!("{}{path}", self.base_url);
        let payload = SubmitPayload::build(model, request);

        tracing::debug!(
            provider = %self.name,
            model = %model,
            modality = %request.modality,
            "sending generation submission"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.bearer_token(context)))
            .header(ASYNC_HEADER, "enable")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.name, error = %e, "generation submission failed");
                TaskGenError::ConnectionError(format!("Failed to send submission request: {e}"))
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let message = provider_message(&body);

            tracing::error!(
                provider = %self.name,
                status = %status,
                model = %model,
                "provider rejected submission"
            );

            return Err(TaskGenError::ProviderRejected { message });
        }

        let wire: SubmitResponse = response.json().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "failed to parse submission response");
            TaskGenError::InternalError(None)
        })?;

        // A success status without a task id is a provider-contract
        // violation, never retried
        let task_id = wire
            .output
            .and_then(|output| output.task_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(TaskGenError::MissingTaskId)?;

        Ok(TaskHandle {
            provider: self.name.clone(),
            task_id,
            submitted_at: Timestamp::now(),
        })
    }

    /// Interpret a task-status response body as the three-way outcome
    fn interpret_status(body: &Value) -> Result<TaskStatus> {
        let output = body.get("output").cloned().unwrap_or(Value::Null);
        let task_status = output.get("task_status").and_then(Value::as_str).unwrap_or("PENDING");

        match task_status {
            "SUCCEEDED" => {
                // Success sentinel with no result reference is a malformed
                // terminal state, not another pending cycle
                let url = normalize::extract_result_url(&output).ok_or(TaskGenError::EmptyResult)?;
                let usage = body
                    .get("usage")
                    .cloned()
                    .and_then(|value| serde_json::from_value::<Usage>(value).ok());

                Ok(TaskStatus::Succeeded { url, usage })
            }
            "FAILED" => {
                let message = output
                    .get("message")
                    .or_else(|| body.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("generation failed")
                    .to_string();

                Ok(TaskStatus::Failed {
                    code: normalize::classify_error(&message),
                    message,
                })
            }
            _ => Ok(TaskStatus::Pending),
        }
    }
}

/// Apply the style-specific prompt prefix
fn apply_style(prompt: &str, style: Option<&str>) -> String {
    style
        .and_then(|selector| STYLE_PREFIXES.iter().find(|(name, _)| *name == selector))
        .map_or_else(|| prompt.to_string(), |(_, prefix)| format!("{prefix}{prompt}"))
}

/// Pull the message field out of an error body, falling back to raw text
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.to_string())
}

// -- Wire types for the DashScope task API --

#[derive(Serialize)]
struct SubmitPayload {
    model: String,
    input: SubmitInput,
    parameters: SubmitParameters,
}

#[derive(Serialize)]
struct SubmitInput {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    img_url: Option<String>,
}

#[derive(Serialize)]
struct SubmitParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
}

impl SubmitPayload {
    /// Build the provider payload; geometry and duration come straight from
    /// the request so fallback attempts cannot drop or alter them
    fn build(model: &str, request: &GenerationRequest) -> Self {
        let parameters = match request.modality {
            Modality::Image => SubmitParameters {
                size: Some(request.size.clone()),
                resolution: None,
                duration: None,
            },
            Modality::Video => SubmitParameters {
                size: None,
                resolution: Some(request.size.clone()),
                duration: request.duration,
            },
        };

        Self {
            model: model.to_string(),
            input: SubmitInput {
                prompt: apply_style(&request.prompt, request.style.as_deref()),
                img_url: request.image_url.clone(),
            },
            parameters,
        }
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    output: Option<SubmitOutput>,
}

#[derive(Deserialize)]
struct SubmitOutput {
    task_id: Option<String>,
}

#[async_trait]
impl GenerationProvider for DashscopeProvider {
    async fn submit(&self, request: &GenerationRequest, context: &RequestContext) -> Result<TaskHandle> {
        self.validate(request)?;

        let targets = self.submission_targets(request);
        let mut rejections: Vec<String> = Vec::new();

        for (i, (model, path)) in targets.into_iter().enumerate() {
            match self.attempt_submit(&model, &path, request, context).await {
                Ok(handle) => {
                    if i > 0 {
                        tracing::info!(
                            provider = %self.name,
                            model = %model,
                            "fallback submission accepted"
                        );
                    }
                    return Ok(handle);
                }
                // Provisioning-type rejection: move on to the next target
                Err(TaskGenError::ProviderRejected { message })
                    if normalize::classify_error(&message) == ErrorCode::ModelNotExist =>
                {
                    tracing::warn!(
                        provider = %self.name,
                        model = %model,
                        "model not provisioned"
                    );
                    rejections.push(format!("{model}: {message}"));
                }
                Err(other) => return Err(other),
            }
        }

        // Rejections of this class are usually account provisioning issues,
        // so the surfaced message must point at configuration, not retrying
        Err(TaskGenError::ProviderRejected {
            message: format!(
                "all configured models were rejected ({}); check that your provider account \
                 has these models enabled and the API key has generation permissions",
                rejections.join("; ")
            ),
        })
    }

    async fn poll(&self, task_id: &str, context: &RequestContext) -> Result<TaskStatus> {
        let url = format!("{}/tasks/{task_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.bearer_token(context)))
            .send()
            .await
            .map_err(|e| TaskGenError::ConnectionError(format!("Failed to check task status: {e}")))?;

        let status = response.status();

        // Non-2xx on a status check is transient from the loop's point of
        // view; the task itself may still be running
        if !status.is_success() {
            return Err(TaskGenError::ConnectionError(format!(
                "status check returned HTTP {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TaskGenError::ConnectionError(format!("unparseable status response: {e}")))?;

        Self::interpret_status(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
