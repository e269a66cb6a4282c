use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Target output medium for a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Modality {
    Image,
    Video,
}

/// Immutable description of what to generate
///
/// Constructed by the caller and never mutated; every fallback submission
/// attempt reuses it verbatim, so size and duration are carried unchanged.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationRequest {
    /// Free-text prompt
    pub prompt: String,
    /// Output medium
    pub modality: Modality,
    /// Model identifier, optionally prefixed as "provider/model"
    pub model: String,
    /// Style selector mapped to a prompt prefix (unmapped styles pass through)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Output geometry as a width*height string from the provider's supported set
    #[serde(default = "default_size")]
    pub size: String,
    /// Clip length in seconds (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Source image URL for edit flows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Default output geometry
fn default_size() -> String {
    "1024*1024".to_string()
}

/// Opaque reference to an in-flight provider job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Name of the configured provider that owns the task
    pub provider: String,
    /// Provider-assigned task identifier
    pub task_id: String,
    /// When the submission was accepted
    pub submitted_at: Timestamp,
}

/// Latest observed task status; only the newest value is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task accepted but not finished
    Pending,
    /// Task finished with a resolved media URL
    Succeeded {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    /// Provider reported a terminal failure
    Failed { code: ErrorCode, message: String },
}

impl TaskStatus {
    /// Whether no further polling should occur after this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Poll loop lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

/// Terminal caller-facing value for a successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Resolved media URL
    pub url: String,
    /// Provider task the result came from
    pub task_id: String,
    /// Usage/cost metadata when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Usage metadata attached to a terminal provider response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<f32>,
}
