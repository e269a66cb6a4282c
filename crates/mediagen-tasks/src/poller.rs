//! Bounded status polling against a submitted task
//!
//! The in-process loop is bounded by attempt count (the interval times the
//! budget gives the wall-clock ceiling); handles resumed from the task store
//! are additionally bounded by the store's staleness window.

use std::time::Duration;

use mediagen_config::PollingConfig;
use mediagen_core::RequestContext;

use crate::{
    error::{Result, TaskGenError},
    provider::GenerationProvider,
    types::{GenerationResult, TaskHandle, TaskState, TaskStatus},
};

/// Timing bounds for a poll loop
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay before each status check
    pub interval: Duration,
    /// Maximum number of status checks
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Poll loop over a single task handle
///
/// Drives the `Submitted → Polling → {Succeeded | Failed | TimedOut}`
/// lifecycle. Once a terminal state is observed, no further status checks
/// are issued for the handle.
pub(crate) struct Poller<'a> {
    provider: &'a dyn GenerationProvider,
    policy: PollPolicy,
    state: TaskState,
    attempts: u32,
}

impl<'a> Poller<'a> {
    pub fn new(provider: &'a dyn GenerationProvider, policy: PollPolicy) -> Self {
        Self {
            provider,
            policy,
            state: TaskState::Submitted,
            attempts: 0,
        }
    }

    /// Lifecycle state after the most recent transition
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Run the loop to a terminal outcome
    ///
    /// Transient connection errors on individual checks are absorbed and
    /// counted against the attempt budget; only a provider-terminal status
    /// or budget exhaustion ends the loop.
    pub async fn run(&mut self, handle: &TaskHandle, context: &RequestContext) -> Result<GenerationResult> {
        while self.attempts < self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            self.attempts += 1;
            self.state = TaskState::Polling;

            match self.provider.poll(&handle.task_id, context).await {
                Ok(TaskStatus::Pending) => {
                    tracing::debug!(
                        task_id = %handle.task_id,
                        attempt = self.attempts,
                        "task still pending"
                    );
                }
                Ok(TaskStatus::Succeeded { url, usage }) => {
                    self.state = TaskState::Succeeded;
                    tracing::info!(
                        task_id = %handle.task_id,
                        attempts = self.attempts,
                        "generation succeeded"
                    );
                    return Ok(GenerationResult {
                        url,
                        task_id: handle.task_id.clone(),
                        usage,
                    });
                }
                Ok(TaskStatus::Failed { code, message }) => {
                    self.state = TaskState::Failed;
                    return Err(TaskGenError::TerminalFailure { code, message });
                }
                Err(TaskGenError::ConnectionError(e)) => {
                    // Status checks are idempotent reads; a flaky check does
                    // not mean the task failed
                    tracing::debug!(
                        task_id = %handle.task_id,
                        attempt = self.attempts,
                        error = %e,
                        "transient poll error, continuing"
                    );
                }
                Err(other) => {
                    self.state = TaskState::Failed;
                    return Err(other);
                }
            }
        }

        self.state = TaskState::TimedOut;
        tracing::warn!(
            task_id = %handle.task_id,
            attempts = self.attempts,
            "attempt budget exhausted while task still pending"
        );
        Err(TaskGenError::Timeout {
            attempts: self.attempts,
        })
    }
}
