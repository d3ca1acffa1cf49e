//! Per-user request throttle for mutating copilot endpoints.
//!
//! Counters live behind a trait so single-instance deployments use a
//! process-local map while multi-instance deployments share a window through
//! Redis. Throttling is not a guardrail decision: a 429 here writes no
//! activity event.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

/// Fixed-window counter. `incr` bumps the count for `key` in the current
/// window and returns the new total, starting a fresh window when the old
/// one has expired.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, AppError>;
}

/// Process-local counter. Sufficient for a single API instance; counts reset
/// on restart.
#[derive(Default)]
pub struct InMemoryCounterStore {
    windows: Mutex<HashMap<String, (i64, u64)>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, AppError> {
        let now = Utc::now().timestamp();
        let window_secs = window.as_secs() as i64;
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| anyhow::anyhow!("counter store mutex poisoned"))?;
        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now - entry.0 >= window_secs {
            *entry = (now, 0);
        }
        entry.1 += 1;
        Ok(entry.1)
    }
}

/// Redis-backed counter: INCR + EXPIRE on first hit, so every instance sees
/// the same window.
pub struct RedisCounterStore {
    client: redis::Client,
}

impl RedisCounterStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str, window: Duration) -> Result<u64, AppError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| anyhow::anyhow!("redis connection failed: {e}"))?;
        let count: u64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis INCR failed: {e}"))?;
        if count == 1 {
            let set: Result<(), redis::RedisError> = redis::cmd("EXPIRE")
                .arg(key)
                .arg(window.as_secs())
                .query_async(&mut conn)
                .await;
            if let Err(e) = set {
                warn!("failed to set expiry on throttle key {key}: {e}");
            }
        }
        Ok(count)
    }
}

/// Checks the per-user minute window; `RateLimited` when over budget.
pub async fn check_throttle(
    counters: &dyn CounterStore,
    user_id: Uuid,
    route: &str,
    per_minute: u64,
) -> Result<(), AppError> {
    let key = format!("copilot:throttle:{user_id}:{route}");
    let count = counters.incr(&key, Duration::from_secs(60)).await?;
    if count > per_minute {
        return Err(AppError::RateLimited);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_counts_within_window() {
        let store = InMemoryCounterStore::new();
        assert_eq!(store.incr("k", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(store.incr("k", Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(store.incr("other", Duration::from_secs(60)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let store = InMemoryCounterStore::new();
        store.incr("k", Duration::from_secs(0)).await.unwrap();
        // zero-length window: the next hit starts a fresh count
        assert_eq!(store.incr("k", Duration::from_secs(0)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_check_throttle_blocks_over_budget() {
        let store = InMemoryCounterStore::new();
        let user = Uuid::new_v4();
        for _ in 0..3 {
            check_throttle(&store, user, "queue", 3).await.unwrap();
        }
        let err = check_throttle(&store, user, "queue", 3).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited));
    }

    #[tokio::test]
    async fn test_throttle_keys_are_per_user_and_route() {
        let store = InMemoryCounterStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        check_throttle(&store, a, "queue", 1).await.unwrap();
        // different user and different route both have fresh budgets
        check_throttle(&store, b, "queue", 1).await.unwrap();
        check_throttle(&store, a, "rules", 1).await.unwrap();
        assert!(check_throttle(&store, a, "queue", 1).await.is_err());
    }
}
