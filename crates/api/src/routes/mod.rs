//! HTTP routes and the state shared by their handlers.

pub mod beer_orders;
pub mod beers;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod shipments;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use common::{DEFAULT_PAGE_SIZE, PageRequest, Version};
use domain::{Audit, UnknownBeerPolicy};
use serde::{Deserialize, Serialize};
use service::{BeerOrderService, BeerService, CustomerService, ShipmentService};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub beer_service: BeerService<S>,
    pub customer_service: CustomerService<S>,
    pub order_service: BeerOrderService<S>,
    pub shipment_service: ShipmentService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, policy: UnknownBeerPolicy) -> Self {
        Self {
            beer_service: BeerService::new(store.clone()),
            customer_service: CustomerService::new(store.clone()),
            order_service: BeerOrderService::new(store.clone(), policy),
            shipment_service: ShipmentService::new(store),
        }
    }
}

/// Resource routes, mounted at the root and under `/api/v1`.
pub fn resource_router<S: Store>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/beers", get(beers::list::<S>).post(beers::create::<S>))
        .route(
            "/beers/{id}",
            get(beers::get::<S>)
                .put(beers::update::<S>)
                .patch(beers::patch::<S>)
                .delete(beers::delete::<S>),
        )
        .route(
            "/customers",
            get(customers::list::<S>).post(customers::create::<S>),
        )
        .route(
            "/customers/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .patch(customers::patch::<S>)
                .delete(customers::delete::<S>),
        )
        .route("/customers/{id}/orders", get(customers::orders::<S>))
        .route(
            "/beer-orders",
            get(beer_orders::list::<S>).post(beer_orders::create::<S>),
        )
        .route(
            "/beer-orders/{id}",
            get(beer_orders::get::<S>)
                .put(beer_orders::update::<S>)
                .delete(beer_orders::delete::<S>),
        )
        .route(
            "/beer-orders/{order_id}/shipments",
            get(shipments::list::<S>).post(shipments::create::<S>),
        )
        .route(
            "/beer-orders/{order_id}/shipments/{shipment_id}",
            get(shipments::get::<S>)
                .put(shipments::update::<S>)
                .delete(shipments::delete::<S>),
        )
}

// -- Shared request/response pieces --

/// `page`/`size` query parameters (0-based page).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Identity and audit columns every response carries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub version: Version,
    pub created_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
}

impl From<&Audit> for AuditResponse {
    fn from(audit: &Audit) -> Self {
        Self {
            version: audit.version,
            created_date: audit.created_date,
            update_date: audit.update_date,
        }
    }
}
