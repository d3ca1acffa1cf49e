use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::guardrails::queue::{add_to_queue, change_status, JobRef, QueueStatus};
use crate::guardrails::rules::GuardrailRule;
use crate::models::guardrail::{ActivityEventRow, QueueItemRow};
use crate::state::AppState;
use crate::throttle::check_throttle;

const QUEUE_PAGE_SIZE: i64 = 100;
const ACTIVITY_PAGE_SIZE: i64 = 50;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/copilot/guardrails
pub async fn handle_get_rule(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GuardrailRule>, AppError> {
    let row = state.store.get_rule_row(params.user_id).await?;
    Ok(Json(GuardrailRule::from_row_opt(row)))
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub rule: GuardrailRule,
}

/// POST /api/v1/copilot/guardrails
pub async fn handle_update_rule(
    State(state): State<AppState>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Json<GuardrailRule>, AppError> {
    check_throttle(
        state.throttle.as_ref(),
        req.user_id,
        "rules",
        state.config.throttle_per_minute,
    )
    .await?;
    req.rule.validate()?;
    state.store.put_rule(req.user_id, &req.rule).await?;
    Ok(Json(req.rule))
}

#[derive(Deserialize)]
pub struct QueueAddRequest {
    pub user_id: Uuid,
    pub job: JobRef,
    #[serde(default, alias = "matchScore")]
    pub match_score: i32,
}

/// POST /api/v1/copilot/queue
pub async fn handle_queue_add(
    State(state): State<AppState>,
    Json(req): Json<QueueAddRequest>,
) -> Result<(StatusCode, Json<QueueItemRow>), AppError> {
    check_throttle(
        state.throttle.as_ref(),
        req.user_id,
        "queue",
        state.config.throttle_per_minute,
    )
    .await?;
    let row = add_to_queue(
        state.store.as_ref(),
        req.user_id,
        req.job,
        req.match_score,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub user_id: Uuid,
    pub status: QueueStatus,
}

/// PATCH /api/v1/copilot/queue/:id/status
pub async fn handle_status_change(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<QueueItemRow>, AppError> {
    check_throttle(
        state.throttle.as_ref(),
        req.user_id,
        "queue",
        state.config.throttle_per_minute,
    )
    .await?;
    let row = change_status(
        state.store.as_ref(),
        req.user_id,
        &id,
        req.status,
        Utc::now(),
    )
    .await?;
    Ok(Json(row))
}

#[derive(Serialize)]
pub struct QueueListResponse {
    pub items: Vec<QueueItemRow>,
    pub activity: Vec<ActivityEventRow>,
}

/// GET /api/v1/copilot/queue
pub async fn handle_queue_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<QueueListResponse>, AppError> {
    let items = state
        .store
        .list_queue_items(params.user_id, QUEUE_PAGE_SIZE)
        .await?;
    let activity = state
        .store
        .list_activity(params.user_id, ACTIVITY_PAGE_SIZE)
        .await?;
    Ok(Json(QueueListResponse { items, activity }))
}
