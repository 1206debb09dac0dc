//! Application services: load, mutate through the domain, persist.
//!
//! Every service is generic over a [`store::Store`] so the same logic runs
//! against the in-memory store and PostgreSQL.

pub mod beer;
pub mod customer;
pub mod error;
pub mod order;
pub mod shipment;

pub use beer::BeerService;
pub use customer::CustomerService;
pub use error::{Result, ServiceError};
pub use order::BeerOrderService;
pub use shipment::ShipmentService;
