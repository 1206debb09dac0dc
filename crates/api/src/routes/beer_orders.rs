//! Beer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BeerId, BeerOrderId, BeerOrderLineId, CustomerId, Money, Page, Version};
use domain::{
    BeerOrder, BeerOrderLine, OrderDraft, OrderLineDraft, OrderStatus, UnknownBeerPolicy,
    ValidationErrors, validation,
};
use serde::{Deserialize, Serialize};
use store::Store;

use super::shipments::{ShipmentRequest, ShipmentResponse};
use super::{AppState, AuditResponse, PageParams};
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /beer-orders` and `PUT /beer-orders/{id}`.
///
/// Identifiers sent for lines or shipments are ignored; children are always
/// rebuilt from their content.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerOrderRequest {
    pub customer_id: Option<CustomerId>,
    pub customer_ref: Option<String>,
    pub payment_amount: Option<Money>,
    pub status: Option<String>,
    #[serde(default)]
    pub beer_order_lines: Vec<BeerOrderLineRequest>,
    #[serde(default, alias = "beerOrderShipments")]
    pub shipments: Vec<ShipmentRequest>,
    pub version: Option<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerOrderLineRequest {
    pub beer_id: Option<BeerId>,
    pub order_quantity: Option<i32>,
    pub quantity_allocated: Option<i32>,
    pub status: Option<String>,
}

impl BeerOrderLineRequest {
    /// `beerId` may be omitted only when lines without a known beer are kept.
    fn validate(self, policy: UnknownBeerPolicy) -> Result<OrderLineDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if policy == UnknownBeerPolicy::Reject {
            validation::required(&mut errors, "beerId", self.beer_id);
        }
        let order_quantity = validation::required(&mut errors, "orderQuantity", self.order_quantity);
        if let Some(quantity) = order_quantity {
            validation::positive(&mut errors, "orderQuantity", quantity);
        }
        if let Some(allocated) = self.quantity_allocated {
            validation::positive_or_zero(&mut errors, "quantityAllocated", allocated);
        }

        let Some(order_quantity) = order_quantity else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(OrderLineDraft {
            beer_id: self.beer_id,
            order_quantity,
            quantity_allocated: self.quantity_allocated.unwrap_or(0),
            status: self.status,
        })
    }
}

impl BeerOrderRequest {
    /// Validates the order and every nested line and shipment, reporting
    /// nested violations as `beerOrderLines[i].field` / `shipments[i].field`.
    pub fn validate(self, policy: UnknownBeerPolicy) -> Result<OrderDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let payment_amount = validation::required(&mut errors, "paymentAmount", self.payment_amount);
        if let Some(amount) = payment_amount {
            validation::positive_money(&mut errors, "paymentAmount", amount);
        }

        let status = match self.status.as_deref().map(str::parse::<OrderStatus>) {
            Some(Ok(status)) => Some(status),
            Some(Err(e)) => {
                errors.add("status", e.to_string());
                None
            }
            None => None,
        };

        if self.beer_order_lines.is_empty() {
            errors.add(
                "beerOrderLines",
                "beer order must have at least one beer order line",
            );
        }

        let mut lines = Vec::with_capacity(self.beer_order_lines.len());
        for (index, line) in self.beer_order_lines.into_iter().enumerate() {
            match line.validate(policy) {
                Ok(draft) => lines.push(draft),
                Err(nested) => errors.extend_nested(&format!("beerOrderLines[{index}]"), nested),
            }
        }

        let mut shipments = Vec::with_capacity(self.shipments.len());
        for (index, shipment) in self.shipments.into_iter().enumerate() {
            match shipment.validate() {
                Ok(draft) => shipments.push(draft),
                Err(nested) => errors.extend_nested(&format!("shipments[{index}]"), nested),
            }
        }

        let Some(payment_amount) = payment_amount else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(OrderDraft {
            customer_id: self.customer_id,
            customer_ref: self.customer_ref,
            payment_amount,
            status,
            lines,
            shipments,
        })
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerOrderLineResponse {
    pub id: Option<BeerOrderLineId>,
    #[serde(flatten)]
    pub audit: AuditResponse,
    pub beer_id: Option<BeerId>,
    pub beer_name: Option<String>,
    pub beer_style: Option<String>,
    pub upc: Option<String>,
    pub order_quantity: i32,
    pub quantity_allocated: i32,
    pub status: Option<String>,
}

impl From<&BeerOrderLine> for BeerOrderLineResponse {
    fn from(line: &BeerOrderLine) -> Self {
        let beer = line.beer.as_ref();
        Self {
            id: line.id,
            audit: AuditResponse::from(&line.audit),
            beer_id: beer.map(|b| b.id),
            beer_name: beer.map(|b| b.name.clone()),
            beer_style: beer.map(|b| b.style.clone()),
            upc: beer.map(|b| b.upc.clone()),
            order_quantity: line.order_quantity,
            quantity_allocated: line.quantity_allocated,
            status: line.status.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerOrderResponse {
    pub id: Option<BeerOrderId>,
    #[serde(flatten)]
    pub audit: AuditResponse,
    pub customer_id: Option<CustomerId>,
    pub customer_ref: Option<String>,
    pub payment_amount: Money,
    pub status: OrderStatus,
    pub beer_order_lines: Vec<BeerOrderLineResponse>,
    pub shipments: Vec<ShipmentResponse>,
}

impl From<BeerOrder> for BeerOrderResponse {
    fn from(order: BeerOrder) -> Self {
        Self {
            id: order.id(),
            audit: AuditResponse::from(order.audit()),
            customer_id: order.customer_id(),
            customer_ref: order.customer_ref().map(str::to_string),
            payment_amount: order.payment_amount(),
            status: order.status(),
            beer_order_lines: order.lines().iter().map(BeerOrderLineResponse::from).collect(),
            shipments: order.shipments().iter().map(ShipmentResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// GET /beer-orders
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<BeerOrderResponse>>, ApiError> {
    let orders = state
        .order_service
        .list_orders(params.page_request())
        .await?;
    Ok(Json(orders.map(BeerOrderResponse::from)))
}

/// GET /beer-orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerOrderId>,
) -> Result<Json<BeerOrderResponse>, ApiError> {
    let order = state.order_service.get_order(id).await?;
    Ok(Json(order.into()))
}

/// POST /beer-orders: create an order with its lines (and optional shipments).
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BeerOrderRequest>,
) -> Result<(StatusCode, Json<BeerOrderResponse>), ApiError> {
    let draft = req.validate(state.order_service.policy())?;
    let order = state.order_service.create_order(draft).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// PUT /beer-orders/{id}: overwrite the order and rebuild its lines.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerOrderId>,
    Json(req): Json<BeerOrderRequest>,
) -> Result<Json<BeerOrderResponse>, ApiError> {
    let version = req.version;
    let draft = req.validate(state.order_service.policy())?;
    let order = state.order_service.update_order(id, draft, version).await?;
    Ok(Json(order.into()))
}

/// DELETE /beer-orders/{id}: removes the order with its lines and shipments.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerOrderId>,
) -> Result<StatusCode, ApiError> {
    state.order_service.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
