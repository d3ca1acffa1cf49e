use std::sync::Arc;

use crate::config::Config;
use crate::guardrails::store::GuardrailStore;
use crate::throttle::CounterStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Guardrail datastore seam. Postgres in production; tests swap in an
    /// in-memory implementation.
    pub store: Arc<dyn GuardrailStore>,
    /// Request-throttle counters. In-memory for a single instance, Redis
    /// when REDIS_URL is configured.
    pub throttle: Arc<dyn CounterStore>,
    pub config: Config,
}
