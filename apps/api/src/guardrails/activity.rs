//! Append-only activity log of guard decisions.
//!
//! Every queue add and every attempted transition to `approved` writes
//! exactly one event, whether the guard allowed or blocked it. The log is
//! the audit trail a user sees when asking "why didn't this job get applied
//! to?".

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::guardrails::store::GuardrailStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    QueueAdd,
    StatusChange,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::QueueAdd => "queue_add",
            ActivityAction::StatusChange => "status_change",
        }
    }
}

/// Outcome of the guardrail check for one action. Distinct from a queue
/// item's job-application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardOutcome {
    Allowed,
    Blocked,
}

impl GuardOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardOutcome::Allowed => "allowed",
            GuardOutcome::Blocked => "blocked",
        }
    }
}

/// Event payload handed to the store for appending.
#[derive(Debug, Clone)]
pub struct NewActivityEvent {
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub status: GuardOutcome,
    pub reason: String,
    pub queue_id: String,
    pub target_status: Option<String>,
    pub host: Option<String>,
    pub dry_run: Option<bool>,
}

impl NewActivityEvent {
    pub fn new(
        user_id: Uuid,
        action: ActivityAction,
        status: GuardOutcome,
        reason: impl Into<String>,
        queue_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action,
            status,
            reason: reason.into(),
            queue_id: queue_id.into(),
            target_status: None,
            host: None,
            dry_run: None,
        }
    }

    pub fn target_status(mut self, status: &str) -> Self {
        self.target_status = Some(status.to_string());
        self
    }

    pub fn host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }
}

/// Appends an event, best-effort. A failed audit write must not block the
/// transition that was already decided; it is logged as a data-quality gap.
pub async fn record_activity(store: &dyn GuardrailStore, event: NewActivityEvent) {
    if let Err(e) = store.append_activity(&event).await {
        warn!(
            queue_id = %event.queue_id,
            action = event.action.as_str(),
            "failed to append activity event: {e}"
        );
    }
}
