//! Customer entity.

use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::error::{DomainError, ValidationErrors};
use crate::validation;

/// The mutable fields of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFields {
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Partial update of a customer. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// A customer placing beer orders.
///
/// Orders point at their customer; the customer's order list is a query,
/// not a stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<CustomerId>,
    pub audit: Audit,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Customer {
    pub fn new(fields: CustomerFields) -> Result<Self, DomainError> {
        let customer = Self::restore(None, Audit::default(), fields);
        customer.check_invariants()?;
        Ok(customer)
    }

    pub fn restore(id: Option<CustomerId>, audit: Audit, fields: CustomerFields) -> Self {
        Self {
            id,
            audit,
            name: fields.name,
            email: fields.email,
            phone_number: fields.phone_number,
            address_line1: fields.address_line1,
            address_line2: fields.address_line2,
            city: fields.city,
            state: fields.state,
            postal_code: fields.postal_code,
        }
    }

    pub fn replace(&mut self, fields: CustomerFields) -> Result<(), DomainError> {
        let replaced = Self::restore(self.id, self.audit, fields);
        replaced.check_invariants()?;
        *self = replaced;
        Ok(())
    }

    /// Merges the supplied fields; all-or-nothing like [`crate::Beer::apply_patch`].
    pub fn apply_patch(&mut self, patch: CustomerPatch) -> Result<(), DomainError> {
        let mut merged = self.clone();
        if let Some(name) = patch.name {
            merged.name = name;
        }
        if let Some(email) = patch.email {
            merged.email = Some(email);
        }
        if let Some(phone_number) = patch.phone_number {
            merged.phone_number = Some(phone_number);
        }
        if let Some(address_line1) = patch.address_line1 {
            merged.address_line1 = address_line1;
        }
        if let Some(address_line2) = patch.address_line2 {
            merged.address_line2 = Some(address_line2);
        }
        if let Some(city) = patch.city {
            merged.city = city;
        }
        if let Some(state) = patch.state {
            merged.state = state;
        }
        if let Some(postal_code) = patch.postal_code {
            merged.postal_code = postal_code;
        }

        merged.check_invariants()?;
        *self = merged;
        Ok(())
    }

    pub fn check_invariants(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::not_blank(&mut errors, "name", &self.name);
        validation::not_blank(&mut errors, "addressLine1", &self.address_line1);
        validation::not_blank(&mut errors, "city", &self.city);
        validation::not_blank(&mut errors, "state", &self.state);
        validation::not_blank(&mut errors, "postalCode", &self.postal_code);
        errors.into_result()
    }
}
