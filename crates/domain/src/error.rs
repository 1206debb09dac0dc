//! Domain error types.

use common::BeerId;
use serde::Serialize;
use thiserror::Error;

use crate::order::OrderStatus;

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field, e.g. `beerOrderLines[0].orderQuantity`.
    pub field: String,
    pub message: String,
}

/// All constraint violations found while checking one payload or entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Merges violations of a nested payload, prefixing their field names.
    pub fn extend_nested(&mut self, prefix: &str, nested: ValidationErrors) {
        for error in nested.errors {
            self.errors.push(FieldError {
                field: format!("{prefix}.{}", error.field),
                message: error.message,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised by entity and aggregate mutators.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more field constraints do not hold.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// An order line references a beer that does not exist.
    #[error("Beer not found: {beer_id}")]
    UnknownBeer { beer_id: BeerId },

    /// The status string is not one of the known order statuses.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// The order cannot move from its current status to the requested one.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
}
