//! HTTP server initialization and runtime setup.
//!
//! Handles rate limit store selection, the store janitor and the Axum server
//! lifecycle.

use crate::api::middleware::pipeline::Pipeline;
use crate::config::Config;
use crate::domain::rate_limit::RateLimitPolicy;
use crate::domain::repositories::RateLimitStore;
use crate::infrastructure::persistence::MemoryDocumentRepository;
use crate::infrastructure::rate_limit::{MemoryRateLimitStore, RedisRateLimitStore};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::clock::{Clock, SystemClock};

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Rate limit store (Redis, or in-memory fallback)
/// - In-memory document collections
/// - Request pipeline
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - The listen address is invalid
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = rate_limit_store(&config, clock.clone()).await;

    let pipeline = Arc::new(Pipeline::standard(&config, store, clock));
    let state = AppState::new(Arc::new(MemoryDocumentRepository::default()));

    let app = app_router(state, pipeline, &config.static_dir);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Connects the Redis store when configured, falling back to process memory.
async fn rate_limit_store(config: &Config, clock: Arc<dyn Clock>) -> Arc<dyn RateLimitStore> {
    if let Some(redis_url) = &config.redis_url {
        match RedisRateLimitStore::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Rate limit store: Redis");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using memory store.", e);
            }
        }
    } else {
        tracing::info!("Rate limit store: memory");
    }

    let store = Arc::new(MemoryRateLimitStore::new());
    let policy = RateLimitPolicy::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    tokio::spawn(purge_expired_windows(store.clone(), policy, clock));
    store
}

/// Drops expired windows once per window length so idle clients do not pile up.
async fn purge_expired_windows(
    store: Arc<MemoryRateLimitStore>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
) {
    let mut interval = tokio::time::interval(policy.window);
    interval.tick().await;

    loop {
        interval.tick().await;
        let before = store.len();
        store.purge_expired(clock.now(), &policy);
        tracing::debug!(
            purged = before.saturating_sub(store.len()),
            "Purged expired rate limit windows"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
