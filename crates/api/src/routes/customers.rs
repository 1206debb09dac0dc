//! Customer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, Page, Version};
use domain::{Customer, CustomerFields, CustomerPatch, ValidationErrors, validation};
use serde::{Deserialize, Serialize};
use store::Store;

use super::beer_orders::BeerOrderResponse;
use super::{AppState, AuditResponse, PageParams};
use crate::error::ApiError;

// -- Request types --

/// Body of `POST /customers` and `PUT /customers/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub version: Option<Version>,
}

impl CustomerRequest {
    pub fn validate(self) -> Result<CustomerFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required_not_blank(&mut errors, "name", self.name.as_deref());
        validation::required_not_blank(&mut errors, "addressLine1", self.address_line1.as_deref());
        validation::required_not_blank(&mut errors, "city", self.city.as_deref());
        validation::required_not_blank(&mut errors, "state", self.state.as_deref());
        validation::required_not_blank(&mut errors, "postalCode", self.postal_code.as_deref());

        let (Some(name), Some(address_line1), Some(city), Some(state), Some(postal_code)) = (
            self.name,
            self.address_line1,
            self.city,
            self.state,
            self.postal_code,
        ) else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(CustomerFields {
            name,
            email: self.email,
            phone_number: self.phone_number,
            address_line1,
            address_line2: self.address_line2,
            city,
            state,
            postal_code,
        })
    }
}

/// Body of `PATCH /customers/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatchRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub version: Option<Version>,
}

impl From<CustomerPatchRequest> for CustomerPatch {
    fn from(req: CustomerPatchRequest) -> Self {
        CustomerPatch {
            name: req.name,
            email: req.email,
            phone_number: req.phone_number,
            address_line1: req.address_line1,
            address_line2: req.address_line2,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
        }
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Option<CustomerId>,
    #[serde(flatten)]
    pub audit: AuditResponse,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            audit: AuditResponse::from(&customer.audit),
            name: customer.name,
            email: customer.email,
            phone_number: customer.phone_number,
            address_line1: customer.address_line1,
            address_line2: customer.address_line2,
            city: customer.city,
            state: customer.state,
            postal_code: customer.postal_code,
        }
    }
}

// -- Handlers --

/// GET /customers
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<CustomerResponse>>, ApiError> {
    let customers = state
        .customer_service
        .list_customers(params.page_request())
        .await?;
    Ok(Json(customers.map(CustomerResponse::from)))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customer_service.get_customer(id).await?;
    Ok(Json(customer.into()))
}

/// POST /customers
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let fields = req.validate()?;
    let customer = state.customer_service.create_customer(fields).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// PUT /customers/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
    Json(req): Json<CustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let version = req.version;
    let fields = req.validate()?;
    let customer = state
        .customer_service
        .update_customer(id, fields, version)
        .await?;
    Ok(Json(customer.into()))
}

/// PATCH /customers/{id}
#[tracing::instrument(skip(state, req))]
pub async fn patch<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
    Json(req): Json<CustomerPatchRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let version = req.version;
    let customer = state
        .customer_service
        .patch_customer(id, req.into(), version)
        .await?;
    Ok(Json(customer.into()))
}

/// DELETE /customers/{id}: orders of the customer are kept.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode, ApiError> {
    state.customer_service.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /customers/{id}/orders
#[tracing::instrument(skip(state))]
pub async fn orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<BeerOrderResponse>>, ApiError> {
    let orders = state.customer_service.orders_of_customer(id).await?;
    Ok(Json(orders.into_iter().map(BeerOrderResponse::from).collect()))
}
