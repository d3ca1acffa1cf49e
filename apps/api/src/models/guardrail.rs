use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted guardrail rule. Every policy column is nullable: older records
/// predate some fields, and decoding applies defaults in one place
/// (`GuardrailRule::from_row_opt`) rather than scattering fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuardrailRuleRow {
    pub user_id: Uuid,
    pub require_approval: Option<bool>,
    pub dry_run: Option<bool>,
    pub daily_approval_limit: Option<i32>,
    pub allowed_domains: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in the auto-apply approval queue.
///
/// `id` is derived from the job's `(source, external_job_id)` pair, so
/// re-adding the same posting overwrites rather than duplicates.
/// `updated_at` buckets approvals into a calendar day for quota counting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueItemRow {
    pub id: String,
    pub user_id: Uuid,
    pub status: String,
    /// Job posting reference, opaque to the guardrail engine except for
    /// `apply_url` (see `JobRef`).
    pub job: Value,
    pub match_score: i32,
    pub requires_manual_approval: Option<bool>,
    pub execution_mode: Option<String>,
    pub dry_run: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of a guard decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityEventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub status: String,
    pub reason: String,
    pub queue_id: String,
    pub target_status: Option<String>,
    pub host: Option<String>,
    pub dry_run: Option<bool>,
    pub created_at: DateTime<Utc>,
}
