//! Domain layer for the beer order service.
//!
//! This crate provides:
//! - Catalog entities (`Beer`, `Customer`) with patch semantics
//! - The `BeerOrder` aggregate owning its lines and shipments
//! - The order status state machine
//! - Field constraint checks shared with the HTTP boundary

pub mod audit;
pub mod beer;
pub mod customer;
pub mod error;
pub mod order;
pub mod validation;

pub use audit::Audit;
pub use beer::{Beer, BeerFields, BeerPatch, BeerRef};
pub use customer::{Customer, CustomerFields, CustomerPatch};
pub use error::{DomainError, FieldError, ValidationErrors};
pub use order::{
    BeerOrder, BeerOrderLine, BeerOrderShipment, OrderDraft, OrderLineDraft, OrderStatus,
    ShipmentDraft, UnknownBeerPolicy,
};
