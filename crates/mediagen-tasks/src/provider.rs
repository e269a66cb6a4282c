pub(crate) mod dashscope;

use async_trait::async_trait;
use mediagen_core::RequestContext;

use crate::{
    error::Result,
    types::{GenerationRequest, TaskHandle, TaskStatus},
};

/// Trait for asynchronous generation provider implementations
///
/// Submission and status checks are separate calls because providers run
/// generation as background tasks; `poll` has GET semantics and may be
/// issued redundantly without side effects.
#[async_trait]
pub(crate) trait GenerationProvider: Send + Sync {
    /// Validate and submit a generation request, returning a task handle
    async fn submit(&self, request: &GenerationRequest, context: &RequestContext) -> Result<TaskHandle>;

    /// Check the current status of a previously submitted task
    async fn poll(&self, task_id: &str, context: &RequestContext) -> Result<TaskStatus>;

    /// Get the provider name
    fn name(&self) -> &str;
}
