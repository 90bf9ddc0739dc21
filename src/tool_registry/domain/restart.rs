//! Restart status and sync reports derived from the change queue.

use super::{ChangeKind, PendingChange, PendingChangeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Projection of a tenant's change queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartStatus {
    /// Changes not yet applied, oldest first.
    pub pending_changes: Vec<PendingChange>,
    /// When a sync last left the queue empty.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl RestartStatus {
    /// Returns whether the runtime is in step with the registry.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.pending_changes.is_empty()
    }
}

/// Change that could not be applied during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedChange {
    /// Identifier of the change that stays queued.
    pub change_id: PendingChangeId,
    /// Name of the affected entity.
    pub entity_name: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Failure description.
    pub reason: String,
}

/// Outcome of one sync run.
///
/// Partial failure is reported here rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Changes applied and removed from the queue.
    pub applied: Vec<PendingChangeId>,
    /// Changes that failed and remain queued.
    pub failed: Vec<FailedChange>,
    /// Queue contents after the run.
    pub pending_changes: Vec<PendingChange>,
    /// When a sync last left the queue empty.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    /// Returns whether every queued change was applied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.pending_changes.is_empty()
    }
}
