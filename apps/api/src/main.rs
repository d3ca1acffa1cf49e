mod config;
mod db;
mod errors;
mod guardrails;
mod models;
mod routes;
mod state;
mod throttle;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::guardrails::store::PgGuardrailStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::throttle::{CounterStore, InMemoryCounterStore, RedisCounterStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("copilot_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Copilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Guardrail datastore
    let store = Arc::new(PgGuardrailStore::new(db));

    // Request throttle: Redis-backed when configured, in-process otherwise
    let throttle: Arc<dyn CounterStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.clone())?;
            info!("Throttle counters backed by Redis");
            Arc::new(RedisCounterStore::new(client))
        }
        None => {
            info!("Throttle counters in-process (single instance)");
            Arc::new(InMemoryCounterStore::new())
        }
    };

    // Build app state
    let state = AppState {
        store,
        throttle,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
