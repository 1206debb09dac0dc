//! Field constraint checks shared by entity invariants and request validators.

use common::Money;

use crate::error::ValidationErrors;

/// Required, non-blank string.
pub fn not_blank(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "must not be blank");
    }
}

/// Required string that may arrive absent.
pub fn required_not_blank(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    match value {
        Some(value) => not_blank(errors, field, value),
        None => errors.add(field, "is required"),
    }
}

pub fn positive(errors: &mut ValidationErrors, field: &str, value: i32) {
    if value <= 0 {
        errors.add(field, "must be positive");
    }
}

pub fn positive_or_zero(errors: &mut ValidationErrors, field: &str, value: i32) {
    if value < 0 {
        errors.add(field, "must be zero or positive");
    }
}

pub fn positive_money(errors: &mut ValidationErrors, field: &str, value: Money) {
    if !value.is_positive() {
        errors.add(field, "must be positive");
    }
}

/// Returns the value or records `field` as missing.
pub fn required<T: Copy>(errors: &mut ValidationErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, "is required");
    }
    value
}
