pub mod health;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::guardrails::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Guardrail rule
        .route(
            "/api/v1/copilot/guardrails",
            get(handlers::handle_get_rule).post(handlers::handle_update_rule),
        )
        // Approval queue
        .route(
            "/api/v1/copilot/queue",
            get(handlers::handle_queue_list).post(handlers::handle_queue_add),
        )
        .route(
            "/api/v1/copilot/queue/:id/status",
            patch(handlers::handle_status_change),
        )
        .with_state(state)
}
