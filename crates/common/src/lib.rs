//! Shared types for the beer order service.

pub mod money;
pub mod page;
pub mod types;

pub use money::Money;
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use types::{BeerId, BeerOrderId, BeerOrderLineId, CustomerId, ShipmentId, Version};
