//! Beer order aggregate and its children.

mod aggregate;
mod line;
mod shipment;
mod status;

pub use aggregate::{BeerOrder, OrderDraft, UnknownBeerPolicy};
pub use line::{BeerOrderLine, OrderLineDraft};
pub use shipment::{BeerOrderShipment, ShipmentDraft};
pub use status::OrderStatus;
