//! Shipment endpoints, nested under their beer order.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use common::{BeerOrderId, ShipmentId, Version};
use domain::{BeerOrderShipment, ShipmentDraft, ValidationErrors, validation};
use serde::{Deserialize, Serialize};
use store::Store;

use super::{AppState, AuditResponse};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    pub shipment_date: Option<NaiveDateTime>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub version: Option<Version>,
}

impl ShipmentRequest {
    pub fn validate(self) -> Result<ShipmentDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(shipment_date) = validation::required(&mut errors, "shipmentDate", self.shipment_date)
        else {
            return Err(errors);
        };
        Ok(ShipmentDraft {
            shipment_date,
            carrier: self.carrier,
            tracking_number: self.tracking_number,
        })
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResponse {
    pub id: Option<ShipmentId>,
    #[serde(flatten)]
    pub audit: AuditResponse,
    pub beer_order_id: Option<BeerOrderId>,
    pub shipment_date: NaiveDateTime,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

impl From<&BeerOrderShipment> for ShipmentResponse {
    fn from(shipment: &BeerOrderShipment) -> Self {
        Self {
            id: shipment.id,
            audit: AuditResponse::from(&shipment.audit),
            beer_order_id: shipment.beer_order_id(),
            shipment_date: shipment.shipment_date,
            carrier: shipment.carrier.clone(),
            tracking_number: shipment.tracking_number.clone(),
        }
    }
}

// -- Handlers --

/// GET /beer-orders/{order_id}/shipments
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<BeerOrderId>,
) -> Result<Json<Vec<ShipmentResponse>>, ApiError> {
    let shipments = state.shipment_service.list_shipments(order_id).await?;
    Ok(Json(shipments.iter().map(ShipmentResponse::from).collect()))
}

/// GET /beer-orders/{order_id}/shipments/{shipment_id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, shipment_id)): Path<(BeerOrderId, ShipmentId)>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment = state
        .shipment_service
        .get_shipment(order_id, shipment_id)
        .await?;
    Ok(Json(ShipmentResponse::from(&shipment)))
}

/// POST /beer-orders/{order_id}/shipments
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<BeerOrderId>,
    Json(req): Json<ShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentResponse>), ApiError> {
    let draft = req.validate()?;
    let shipment = state
        .shipment_service
        .create_shipment(order_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(ShipmentResponse::from(&shipment))))
}

/// PUT /beer-orders/{order_id}/shipments/{shipment_id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, shipment_id)): Path<(BeerOrderId, ShipmentId)>,
    Json(req): Json<ShipmentRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let version = req.version;
    let draft = req.validate()?;
    let shipment = state
        .shipment_service
        .update_shipment(order_id, shipment_id, draft, version)
        .await?;
    Ok(Json(ShipmentResponse::from(&shipment)))
}

/// DELETE /beer-orders/{order_id}/shipments/{shipment_id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path((order_id, shipment_id)): Path<(BeerOrderId, ShipmentId)>,
) -> Result<StatusCode, ApiError> {
    state
        .shipment_service
        .delete_shipment(order_id, shipment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
