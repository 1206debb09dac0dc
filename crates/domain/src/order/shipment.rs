//! Order shipments.

use chrono::NaiveDateTime;
use common::{BeerOrderId, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::audit::Audit;

/// A validated request for one shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentDraft {
    pub shipment_date: NaiveDateTime,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

/// A shipment of (part of) a beer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerOrderShipment {
    pub id: Option<ShipmentId>,
    pub audit: Audit,
    /// Back-reference to the owning order; only [`super::BeerOrder`] writes it.
    beer_order_id: Option<BeerOrderId>,
    pub shipment_date: NaiveDateTime,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

impl BeerOrderShipment {
    /// Creates a detached shipment from a draft.
    pub fn new(draft: ShipmentDraft) -> Self {
        Self {
            id: None,
            audit: Audit::default(),
            beer_order_id: None,
            shipment_date: draft.shipment_date,
            carrier: draft.carrier,
            tracking_number: draft.tracking_number,
        }
    }

    /// Rebuilds a stored shipment. Stored shipments always belong to an order.
    pub fn restore(
        id: ShipmentId,
        audit: Audit,
        beer_order_id: BeerOrderId,
        draft: ShipmentDraft,
    ) -> Self {
        Self {
            id: Some(id),
            audit,
            beer_order_id: Some(beer_order_id),
            shipment_date: draft.shipment_date,
            carrier: draft.carrier,
            tracking_number: draft.tracking_number,
        }
    }

    /// Returns the order this shipment is attached to.
    pub fn beer_order_id(&self) -> Option<BeerOrderId> {
        self.beer_order_id
    }

    /// Returns true if this shipment is attached to `order_id`.
    pub fn belongs_to(&self, order_id: BeerOrderId) -> bool {
        self.beer_order_id == Some(order_id)
    }

    /// Overwrites the shipment details, keeping identity and parent.
    pub fn update_details(&mut self, draft: ShipmentDraft) {
        self.shipment_date = draft.shipment_date;
        self.carrier = draft.carrier;
        self.tracking_number = draft.tracking_number;
    }

    pub(crate) fn set_beer_order_id(&mut self, beer_order_id: Option<BeerOrderId>) {
        self.beer_order_id = beer_order_id;
    }
}
