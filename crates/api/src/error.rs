//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ValidationErrors};
use service::ServiceError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request fields failed validation.
    Validation(ValidationErrors),
    /// The request conflicts with the current state of the resource.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "Validation failed",
                    "fieldErrors": errors.errors(),
                }),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation(errors) => ApiError::Validation(errors),
        DomainError::UnknownBeer { .. } | DomainError::UnknownStatus(_) => {
            ApiError::BadRequest(err.to_string())
        }
        DomainError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
    }
}

fn store_error_to_api(err: StoreError) -> ApiError {
    match &err {
        StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        StoreError::VersionConflict { .. } | StoreError::Referenced { .. } => {
            ApiError::Conflict(err.to_string())
        }
        StoreError::MissingReference { .. } => ApiError::BadRequest(err.to_string()),
        StoreError::Detached { .. }
        | StoreError::Database(_)
        | StoreError::Migration(_)
        | StoreError::Corrupt(_) => ApiError::Internal(err.to_string()),
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ServiceError::StaleVersion { .. } => ApiError::Conflict(err.to_string()),
            ServiceError::Domain(err) => domain_error_to_api(err),
            ServiceError::Store(err) => store_error_to_api(err),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}
