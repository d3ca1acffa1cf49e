//! Datastore seam for the guardrail engine.
//!
//! The engine only needs read-one, write-with-merge, and the
//! status + timestamp filter that computes today's approval count, so those
//! are the whole trait. Postgres backs it in production; tests use the
//! in-memory implementation below. Datastore failures surface as
//! `AppError::Database` and are never conflated with guardrail blocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::guardrails::activity::NewActivityEvent;
use crate::guardrails::queue::QueueStatus;
use crate::guardrails::rules::GuardrailRule;
use crate::models::guardrail::{ActivityEventRow, GuardrailRuleRow, QueueItemRow};

/// Field set written when a queue item changes status. Approval metadata is
/// only present for transitions into `approved`.
#[derive(Debug, Clone)]
pub struct QueueStatusUpdate {
    pub status: QueueStatus,
    pub updated_at: DateTime<Utc>,
    pub requires_manual_approval: Option<bool>,
    pub execution_mode: Option<String>,
    pub dry_run: Option<bool>,
}

#[async_trait]
pub trait GuardrailStore: Send + Sync {
    async fn get_rule_row(&self, user_id: Uuid) -> Result<Option<GuardrailRuleRow>, AppError>;
    async fn put_rule(&self, user_id: Uuid, rule: &GuardrailRule) -> Result<(), AppError>;

    async fn get_queue_item(
        &self,
        user_id: Uuid,
        id: &str,
    ) -> Result<Option<QueueItemRow>, AppError>;
    async fn upsert_queue_item(&self, row: &QueueItemRow) -> Result<(), AppError>;
    async fn update_queue_status(
        &self,
        user_id: Uuid,
        id: &str,
        update: &QueueStatusUpdate,
    ) -> Result<(), AppError>;
    /// Approved items with `updated_at >= since`, i.e. today's approvals when
    /// `since` is the current day-window start.
    async fn count_approvals_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;
    async fn list_queue_items(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<QueueItemRow>, AppError>;

    async fn append_activity(&self, event: &NewActivityEvent) -> Result<(), AppError>;
    async fn list_activity(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityEventRow>, AppError>;
}

/// Postgres-backed store.
///
/// The count-then-approve sequence runs as two statements without an
/// enclosing transaction, so concurrent approvals near the quota boundary
/// can race past the limit by a small margin (see DESIGN.md).
#[derive(Clone)]
pub struct PgGuardrailStore {
    pool: PgPool,
}

impl PgGuardrailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuardrailStore for PgGuardrailStore {
    async fn get_rule_row(&self, user_id: Uuid) -> Result<Option<GuardrailRuleRow>, AppError> {
        let row: Option<GuardrailRuleRow> =
            sqlx::query_as("SELECT * FROM copilot_guardrail_rules WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn put_rule(&self, user_id: Uuid, rule: &GuardrailRule) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO copilot_guardrail_rules
                (user_id, require_approval, dry_run, daily_approval_limit, allowed_domains, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                require_approval = EXCLUDED.require_approval,
                dry_run = EXCLUDED.dry_run,
                daily_approval_limit = EXCLUDED.daily_approval_limit,
                allowed_domains = EXCLUDED.allowed_domains,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(rule.require_approval)
        .bind(rule.dry_run)
        .bind(rule.daily_approval_limit)
        .bind(&rule.allowed_domains)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_queue_item(
        &self,
        user_id: Uuid,
        id: &str,
    ) -> Result<Option<QueueItemRow>, AppError> {
        let row: Option<QueueItemRow> =
            sqlx::query_as("SELECT * FROM copilot_queue_items WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn upsert_queue_item(&self, row: &QueueItemRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO copilot_queue_items
                (id, user_id, status, job, match_score, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, id) DO UPDATE SET
                status = EXCLUDED.status,
                job = EXCLUDED.job,
                match_score = EXCLUDED.match_score,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&row.id)
        .bind(row.user_id)
        .bind(&row.status)
        .bind(&row.job)
        .bind(row.match_score)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_queue_status(
        &self,
        user_id: Uuid,
        id: &str,
        update: &QueueStatusUpdate,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE copilot_queue_items SET
                status = $3,
                updated_at = $4,
                requires_manual_approval = COALESCE($5, requires_manual_approval),
                execution_mode = COALESCE($6, execution_mode),
                dry_run = COALESCE($7, dry_run)
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(update.status.as_str())
        .bind(update.updated_at)
        .bind(update.requires_manual_approval)
        .bind(&update.execution_mode)
        .bind(update.dry_run)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_approvals_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM copilot_queue_items
            WHERE user_id = $1 AND status = 'approved' AND updated_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_queue_items(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<QueueItemRow>, AppError> {
        let rows: Vec<QueueItemRow> = sqlx::query_as(
            "SELECT * FROM copilot_queue_items WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn append_activity(&self, event: &NewActivityEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO copilot_activity_events
                (id, user_id, action, status, reason, queue_id, target_status, host, dry_run, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(event.action.as_str())
        .bind(event.status.as_str())
        .bind(&event.reason)
        .bind(&event.queue_id)
        .bind(&event.target_status)
        .bind(&event.host)
        .bind(event.dry_run)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_activity(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ActivityEventRow>, AppError> {
        let rows: Vec<ActivityEventRow> = sqlx::query_as(
            "SELECT * FROM copilot_activity_events WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
