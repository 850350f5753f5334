//! HTTP API server with observability for the service request system.
//!
//! Provides REST endpoints for managing service requests, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::RepositoryFactory;
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::{InMemoryDatabase, PersistenceError, PostgresDatabase};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::service_requests::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/servicerequest",
            get(routes::service_requests::list).post(routes::service_requests::create),
        )
        .route(
            "/api/servicerequest/{id}",
            get(routes::service_requests::get)
                .put(routes::service_requests::update)
                .delete(routes::service_requests::delete),
        )
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

/// Creates application state over the given store.
pub fn create_state(repositories: Arc<dyn RepositoryFactory>) -> Arc<AppState> {
    Arc::new(AppState { repositories })
}

/// Connects the store selected by `config`.
///
/// With `DATABASE_URL` set this connects to PostgreSQL and runs migrations;
/// otherwise it creates an in-memory database.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn RepositoryFactory>, PersistenceError> {
    let strategy = config.execution_strategy();
    match &config.database_url {
        Some(url) => {
            let database = PostgresDatabase::connect(url, config.db_max_connections, strategy).await?;
            database.run_migrations().await?;
            tracing::info!("connected to PostgreSQL store");
            Ok(Arc::new(database))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(InMemoryDatabase::with_execution_strategy(strategy)))
        }
    }
}
