//! Approval queue state machine: `pending → approved | rejected`.
//!
//! A transition into `approved` must pass the daily quota guard and the
//! apply-URL allowlist at the moment of transition; `rejected` is
//! unconditional. Terminal states are not locked: re-submitting a status
//! change re-runs the same guards (so a rejected item can still be approved
//! later if it passes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::guardrails::activity::{record_activity, ActivityAction, GuardOutcome, NewActivityEvent};
use crate::guardrails::day_window::day_window;
use crate::guardrails::domain::is_apply_url_allowed;
use crate::guardrails::quota::approvals_limit_reached;
use crate::guardrails::rules::GuardrailRule;
use crate::guardrails::store::{GuardrailStore, QueueStatusUpdate};
use crate::models::guardrail::QueueItemRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Approved,
    Rejected,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Approved => "approved",
            QueueStatus::Rejected => "rejected",
        }
    }
}

/// External job posting reference. Opaque to the guardrail engine except for
/// `apply_url`, which the allowlist guard inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRef {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    pub apply_url: String,
    pub source: String,
    pub external_job_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Derives the queue item id from `(source, external_job_id)`.
///
/// Rule: lowercase both parts, join with `-`, then drop every character
/// outside `[a-z0-9._-]`. Deterministic, so re-adding the same posting
/// overwrites its existing queue entry instead of duplicating it.
pub fn queue_item_id(source: &str, external_job_id: &str) -> String {
    let raw = format!(
        "{}-{}",
        source.to_ascii_lowercase(),
        external_job_id.to_ascii_lowercase()
    );
    raw.chars()
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(*c, '.' | '_' | '-')
        })
        .collect()
}

/// Adds a job to the approval queue in `pending` state. Queueing is never
/// guarded; the guards run at approval time.
pub async fn add_to_queue(
    store: &dyn GuardrailStore,
    user_id: Uuid,
    job: JobRef,
    match_score: i32,
    now: DateTime<Utc>,
) -> Result<QueueItemRow, AppError> {
    if job.source.trim().is_empty() || job.external_job_id.trim().is_empty() {
        return Err(AppError::Validation(
            "job.source and job.externalJobId are required".to_string(),
        ));
    }

    let row = QueueItemRow {
        id: queue_item_id(&job.source, &job.external_job_id),
        user_id,
        status: QueueStatus::Pending.as_str().to_string(),
        job: serde_json::to_value(&job).map_err(anyhow::Error::from)?,
        match_score: match_score.clamp(0, 100),
        requires_manual_approval: None,
        execution_mode: None,
        dry_run: None,
        created_at: now,
        updated_at: now,
    };
    store.upsert_queue_item(&row).await?;

    record_activity(
        store,
        NewActivityEvent::new(
            user_id,
            ActivityAction::QueueAdd,
            GuardOutcome::Allowed,
            "Job added to approval queue.",
            &row.id,
        )
        .target_status(QueueStatus::Pending.as_str()),
    )
    .await;

    Ok(row)
}

/// Applies a status change to a queue item, running the approval guards when
/// the target is `approved`. Returns the updated row.
pub async fn change_status(
    store: &dyn GuardrailStore,
    user_id: Uuid,
    id: &str,
    target: QueueStatus,
    now: DateTime<Utc>,
) -> Result<QueueItemRow, AppError> {
    let item = store
        .get_queue_item(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Queue item {id} not found")))?;

    match target {
        QueueStatus::Pending => Err(AppError::Validation(
            "status must be 'approved' or 'rejected'".to_string(),
        )),
        QueueStatus::Rejected => reject(store, user_id, item, now).await,
        QueueStatus::Approved => approve(store, user_id, item, now).await,
    }
}

async fn reject(
    store: &dyn GuardrailStore,
    user_id: Uuid,
    mut item: QueueItemRow,
    now: DateTime<Utc>,
) -> Result<QueueItemRow, AppError> {
    let update = QueueStatusUpdate {
        status: QueueStatus::Rejected,
        updated_at: now,
        requires_manual_approval: None,
        execution_mode: None,
        dry_run: None,
    };
    store.update_queue_status(user_id, &item.id, &update).await?;

    record_activity(
        store,
        NewActivityEvent::new(
            user_id,
            ActivityAction::StatusChange,
            GuardOutcome::Allowed,
            "Queue item marked as rejected.",
            &item.id,
        )
        .target_status(QueueStatus::Rejected.as_str()),
    )
    .await;

    item.status = QueueStatus::Rejected.as_str().to_string();
    item.updated_at = now;
    Ok(item)
}

async fn approve(
    store: &dyn GuardrailStore,
    user_id: Uuid,
    mut item: QueueItemRow,
    now: DateTime<Utc>,
) -> Result<QueueItemRow, AppError> {
    let rule = GuardrailRule::from_row_opt(store.get_rule_row(user_id).await?);

    // Quota guard: approvals already granted inside today's UTC day window.
    let window = day_window(now);
    let approved_today = store.count_approvals_since(user_id, window.start).await?;
    if approvals_limit_reached(approved_today, rule.daily_approval_limit) {
        let limit = rule.daily_approval_limit.max(1);
        record_activity(
            store,
            NewActivityEvent::new(
                user_id,
                ActivityAction::StatusChange,
                GuardOutcome::Blocked,
                format!("Daily approval limit reached ({limit})."),
                &item.id,
            )
            .target_status(QueueStatus::Approved.as_str()),
        )
        .await;
        return Err(AppError::QuotaExceeded(limit));
    }

    // Allowlist guard on the job's apply URL.
    let apply_url = item
        .job
        .get("applyUrl")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let check = is_apply_url_allowed(apply_url, &rule.effective_allowlist());
    if !check.ok {
        record_activity(
            store,
            NewActivityEvent::new(
                user_id,
                ActivityAction::StatusChange,
                GuardOutcome::Blocked,
                "Apply URL domain is not in the allowlist.",
                &item.id,
            )
            .target_status(QueueStatus::Approved.as_str())
            .host(check.host),
        )
        .await;
        return Err(AppError::DomainNotAllowed);
    }

    let execution_mode = if rule.dry_run {
        "dry-run"
    } else {
        "manual-approved"
    };
    let update = QueueStatusUpdate {
        status: QueueStatus::Approved,
        updated_at: now,
        requires_manual_approval: Some(rule.require_approval),
        execution_mode: Some(execution_mode.to_string()),
        dry_run: Some(rule.dry_run),
    };
    store.update_queue_status(user_id, &item.id, &update).await?;

    let reason = if rule.dry_run {
        "Approved in dry-run mode. No external apply attempt was triggered."
    } else {
        "Queue item marked as approved."
    };
    record_activity(
        store,
        NewActivityEvent::new(
            user_id,
            ActivityAction::StatusChange,
            GuardOutcome::Allowed,
            reason,
            &item.id,
        )
        .target_status(QueueStatus::Approved.as_str())
        .host(check.host)
        .dry_run(rule.dry_run),
    )
    .await;

    item.status = QueueStatus::Approved.as_str().to_string();
    item.updated_at = now;
    item.requires_manual_approval = Some(rule.require_approval);
    item.execution_mode = Some(execution_mode.to_string());
    item.dry_run = Some(rule.dry_run);
    Ok(item)
}
