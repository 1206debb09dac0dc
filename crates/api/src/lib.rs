//! HTTP API server with observability for the beer order service.
//!
//! Provides REST endpoints for the beer catalog, customers, beer orders and
//! their shipments, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::UnknownBeerPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// Resource routes are served at the root and again under `/api/v1`.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let resources = routes::resource_router::<S>().with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(resources.clone())
        .nest("/api/v1", resources)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with every service sharing `store`.
pub fn create_default_state<S: Store>(store: S, policy: UnknownBeerPolicy) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, policy))
}
