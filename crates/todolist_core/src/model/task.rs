//! Task domain model.
//!
//! # Responsibility
//! - Define the value snapshot handed out by the repository.
//! - Provide constructors for the two creation paths (user input, seed import).
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `id`, `created_at` and `remote_id` never change after creation.
//! - Snapshots are detached copies; mutating one never touches storage.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable local identifier of a task.
pub type TaskId = Uuid;

/// Detached value copy of one persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskModel {
    /// Locally generated identity, unique across the store.
    pub id: TaskId,
    /// Seed item id. Only set for tasks created by the bootstrap import.
    pub remote_id: Option<i64>,
    /// Display title. Callers are expected to reject blank titles.
    pub title: String,
    /// Free-form description, may be empty.
    pub details: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub is_completed: bool,
}

impl TaskModel {
    /// Creates a fresh, not yet completed task stamped with the current time.
    pub fn new(title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_id: None,
            title: title.into(),
            details: details.into(),
            created_at: now_epoch_ms(),
            is_completed: false,
        }
    }

    /// Creates a task that mirrors one imported seed item.
    ///
    /// The local `id` is always freshly generated; `remote_id` keeps the link
    /// to the seed record for provenance only.
    pub fn imported(
        remote_id: i64,
        title: impl Into<String>,
        details: impl Into<String>,
        is_completed: bool,
    ) -> Self {
        Self {
            remote_id: Some(remote_id),
            is_completed,
            ..Self::new(title, details)
        }
    }

    /// Returns whether this task came from the seed import.
    pub fn is_imported(&self) -> bool {
        self.remote_id.is_some()
    }
}

/// Current wall clock as Unix epoch milliseconds.
///
/// Clamps to `0` if the system clock is before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
