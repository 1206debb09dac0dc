//! Beer catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BeerId, Money, Page, Version};
use domain::{Beer, BeerFields, BeerPatch, ValidationErrors, validation};
use serde::{Deserialize, Serialize};
use store::{BeerFilter, Store};

use super::{AppState, AuditResponse, PageParams};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerListParams {
    #[serde(alias = "beerName")]
    pub name: Option<String>,
    #[serde(alias = "beerStyle")]
    pub style: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Body of `POST /beers` and `PUT /beers/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerRequest {
    #[serde(alias = "beerName")]
    pub name: Option<String>,
    #[serde(alias = "beerStyle")]
    pub style: Option<String>,
    pub upc: Option<String>,
    pub quantity_on_hand: Option<i32>,
    pub price: Option<Money>,
    pub description: Option<String>,
    pub version: Option<Version>,
}

impl BeerRequest {
    /// Checks every field constraint, reporting all violations at once.
    pub fn validate(self) -> Result<BeerFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::required_not_blank(&mut errors, "name", self.name.as_deref());
        validation::required_not_blank(&mut errors, "style", self.style.as_deref());
        validation::required_not_blank(&mut errors, "upc", self.upc.as_deref());
        if let Some(quantity) = validation::required(&mut errors, "quantityOnHand", self.quantity_on_hand) {
            validation::positive_or_zero(&mut errors, "quantityOnHand", quantity);
        }
        if let Some(price) = validation::required(&mut errors, "price", self.price) {
            validation::positive_money(&mut errors, "price", price);
        }

        let (Some(name), Some(style), Some(upc), Some(quantity_on_hand), Some(price)) = (
            self.name,
            self.style,
            self.upc,
            self.quantity_on_hand,
            self.price,
        ) else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(BeerFields {
            name,
            style,
            upc,
            quantity_on_hand,
            price,
            description: self.description,
        })
    }
}

/// Body of `PATCH /beers/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerPatchRequest {
    #[serde(alias = "beerName")]
    pub name: Option<String>,
    #[serde(alias = "beerStyle")]
    pub style: Option<String>,
    pub upc: Option<String>,
    pub quantity_on_hand: Option<i32>,
    pub price: Option<Money>,
    pub description: Option<String>,
    pub version: Option<Version>,
}

impl From<BeerPatchRequest> for BeerPatch {
    fn from(req: BeerPatchRequest) -> Self {
        BeerPatch {
            name: req.name,
            style: req.style,
            upc: req.upc,
            quantity_on_hand: req.quantity_on_hand,
            description: req.description,
            price: req.price,
        }
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerResponse {
    pub id: Option<BeerId>,
    #[serde(flatten)]
    pub audit: AuditResponse,
    pub name: String,
    pub style: String,
    pub upc: String,
    pub quantity_on_hand: i32,
    pub price: Money,
    pub description: Option<String>,
}

impl From<Beer> for BeerResponse {
    fn from(beer: Beer) -> Self {
        Self {
            id: beer.id,
            audit: AuditResponse::from(&beer.audit),
            name: beer.name,
            style: beer.style,
            upc: beer.upc,
            quantity_on_hand: beer.quantity_on_hand,
            price: beer.price,
            description: beer.description,
        }
    }
}

// -- Handlers --

/// GET /beers: list beers, optionally filtered by name and style.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<BeerListParams>,
) -> Result<Json<Page<BeerResponse>>, ApiError> {
    let mut filter = BeerFilter::new();
    filter.name = params.name;
    filter.style = params.style;
    let page = PageParams {
        page: params.page,
        size: params.size,
    }
    .page_request();

    let beers = state.beer_service.list_beers(&filter, page).await?;
    Ok(Json(beers.map(BeerResponse::from)))
}

/// GET /beers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerId>,
) -> Result<Json<BeerResponse>, ApiError> {
    let beer = state.beer_service.get_beer(id).await?;
    Ok(Json(beer.into()))
}

/// POST /beers
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BeerRequest>,
) -> Result<(StatusCode, Json<BeerResponse>), ApiError> {
    let fields = req.validate()?;
    let beer = state.beer_service.create_beer(fields).await?;
    Ok((StatusCode::CREATED, Json(beer.into())))
}

/// PUT /beers/{id}: replace every mutable field.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerId>,
    Json(req): Json<BeerRequest>,
) -> Result<Json<BeerResponse>, ApiError> {
    let version = req.version;
    let fields = req.validate()?;
    let beer = state.beer_service.update_beer(id, fields, version).await?;
    Ok(Json(beer.into()))
}

/// PATCH /beers/{id}: merge only the supplied fields.
#[tracing::instrument(skip(state, req))]
pub async fn patch<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerId>,
    Json(req): Json<BeerPatchRequest>,
) -> Result<Json<BeerResponse>, ApiError> {
    let version = req.version;
    let beer = state
        .beer_service
        .patch_beer(id, req.into(), version)
        .await?;
    Ok(Json(beer.into()))
}

/// DELETE /beers/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<BeerId>,
) -> Result<StatusCode, ApiError> {
    state.beer_service.delete_beer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
