//! HTTP API server for the order lifecycle coordinator.
//!
//! Provides REST endpoints for order creation, transitions, statistics and
//! SLA escalation, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::SystemClock;
use lifecycle::{LifecycleError, OrderLifecycle};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{FileOrderStore, StoreError};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, ConfigError};
use routes::orders::AppState;

/// Errors that abort server startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open order store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to restore orders: {0}")]
    Restore(#[from] LifecycleError),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/history", get(routes::orders::history))
        .route("/orders/{id}/transitions", post(routes::orders::transition))
        .route("/statistics", get(routes::statistics::get))
        .route("/sla/overdue", get(routes::statistics::overdue))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wraps a coordinator as shared handler state.
pub fn create_state(lifecycle: OrderLifecycle) -> Arc<AppState> {
    Arc::new(AppState { lifecycle })
}

/// Builds the coordinator described by `config`.
///
/// With `ORDER_STORE_DIR` set, orders are restored from and written through
/// to a file store; otherwise they live in memory only.
pub async fn build_lifecycle(config: &Config) -> Result<OrderLifecycle, StartupError> {
    let settings = config.lifecycle_settings()?;
    let policy = settings.sla.hours_by_priority;
    let graph = settings.lifecycle_graph;
    tracing::info!(%graph, priorities = policy.priorities().count(), "lifecycle configured");

    match &config.order_store_dir {
        Some(dir) => {
            let store = Arc::new(FileOrderStore::open(dir).await?);
            Ok(OrderLifecycle::restore(policy, graph, SystemClock, store).await?)
        }
        None => Ok(OrderLifecycle::new(policy, graph, SystemClock)),
    }
}
