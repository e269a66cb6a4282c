//! In-flight task persistence keyed by modality
//!
//! One UI surface is expected per modality, so writes are last-writer-wins
//! with no transactional guarantee. Entries older than the staleness window
//! are dropped on load instead of resumed.

use std::time::Duration;

use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::types::{GenerationRequest, Modality, TaskHandle, TaskState};

/// Persisted snapshot of an in-flight generation task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTask {
    pub handle: TaskHandle,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub size: String,
    pub modality: Modality,
    pub state: TaskState,
    /// Client-facing progress estimate, 0-100
    pub progress: u8,
}

impl PersistedTask {
    /// Snapshot a freshly submitted task
    pub fn from_submission(request: &GenerationRequest, handle: TaskHandle) -> Self {
        Self {
            handle,
            prompt: request.prompt.clone(),
            style: request.style.clone(),
            size: request.size.clone(),
            modality: request.modality,
            state: TaskState::Submitted,
            progress: 0,
        }
    }
}

/// Modality-keyed store for resuming polling across client reloads
pub struct TaskStore {
    entries: DashMap<Modality, PersistedTask>,
    staleness: SignedDuration,
}

impl TaskStore {
    /// Create a store with the given staleness window
    pub fn new(staleness: Duration) -> Self {
        let staleness =
            SignedDuration::from_secs(i64::try_from(staleness.as_secs()).unwrap_or(i64::MAX));

        Self {
            entries: DashMap::new(),
            staleness,
        }
    }

    /// Save a task snapshot, replacing any previous one for the modality
    pub fn save(&self, task: PersistedTask) {
        self.entries.insert(task.modality, task);
    }

    /// Load the current task for a modality, applying the staleness check
    ///
    /// Non-terminal tasks come back in `Polling` state so a resumed loop
    /// continues polling instead of re-submitting. Stale entries are removed
    /// and `None` is returned.
    pub fn load(&self, modality: Modality) -> Option<PersistedTask> {
        let entry = self.entries.get(&modality)?;
        let mut task = entry.clone();
        drop(entry);

        let age = Timestamp::now().duration_since(task.handle.submitted_at);
        if age >= self.staleness {
            tracing::debug!(
                task_id = %task.handle.task_id,
                modality = %modality,
                "dropping stale persisted task"
            );
            self.entries.remove(&modality);
            return None;
        }

        if matches!(task.state, TaskState::Submitted | TaskState::Polling) {
            task.state = TaskState::Polling;
        }

        Some(task)
    }

    /// Update the lifecycle state of the stored task for a modality
    ///
    /// No-op if the stored handle no longer matches (a newer task replaced it)
    pub fn update_state(&self, handle: &TaskHandle, modality: Modality, state: TaskState) {
        if let Some(mut entry) = self.entries.get_mut(&modality) {
            if entry.handle.task_id == handle.task_id {
                entry.state = state;
                if state == TaskState::Succeeded {
                    entry.progress = 100;
                }
            }
        }
    }

    /// Remove the stored task for a modality
    pub fn clear(&self, modality: Modality) {
        self.entries.remove(&modality);
    }
}
