//! Prometheus metrics endpoint and the counters the service records.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers descriptions for the counters recorded by the services and
/// stores, so they show up with help text in the exposition.
pub fn describe() {
    metrics::describe_counter!("beers_created_total", "Beers added to the catalog");
    metrics::describe_counter!("beer_orders_created_total", "Beer orders created");
    metrics::describe_counter!("beer_orders_deleted_total", "Beer orders deleted");
    metrics::describe_counter!("shipments_created_total", "Shipments added to beer orders");
    metrics::describe_counter!(
        "store_version_conflicts_total",
        "Writes rejected because the stored row changed since it was read"
    );
}

/// GET /metrics: returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
