//! Order lines.

use common::{BeerId, BeerOrderId, BeerOrderLineId};
use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::beer::BeerRef;
use crate::error::ValidationErrors;
use crate::validation;

/// A validated request for one order line.
///
/// Drafts never carry an identifier: every line built from a draft is a new row.
/// `beer_id` may only be absent when unknown beers are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDraft {
    pub beer_id: Option<BeerId>,
    pub order_quantity: i32,
    pub quantity_allocated: i32,
    pub status: Option<String>,
}

impl OrderLineDraft {
    pub fn new(beer_id: BeerId, order_quantity: i32) -> Self {
        Self {
            beer_id: Some(beer_id),
            order_quantity,
            quantity_allocated: 0,
            status: None,
        }
    }
}

/// One line of a beer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerOrderLine {
    pub id: Option<BeerOrderLineId>,
    pub audit: Audit,
    /// Back-reference to the owning order; only [`super::BeerOrder`] writes it.
    beer_order_id: Option<BeerOrderId>,
    pub beer: Option<BeerRef>,
    pub order_quantity: i32,
    pub quantity_allocated: i32,
    pub status: Option<String>,
}

impl BeerOrderLine {
    /// Creates a detached line for `beer` from a draft.
    pub fn new(beer: Option<BeerRef>, draft: &OrderLineDraft) -> Self {
        Self {
            id: None,
            audit: Audit::default(),
            beer_order_id: None,
            beer,
            order_quantity: draft.order_quantity,
            quantity_allocated: draft.quantity_allocated,
            status: draft.status.clone(),
        }
    }

    /// Rebuilds a detached line from stored columns. Attach it with
    /// [`super::BeerOrder::add_line`].
    pub fn restore(
        id: BeerOrderLineId,
        audit: Audit,
        beer: Option<BeerRef>,
        order_quantity: i32,
        quantity_allocated: i32,
        status: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            audit,
            beer_order_id: None,
            beer,
            order_quantity,
            quantity_allocated,
            status,
        }
    }

    /// Returns the order this line is attached to.
    pub fn beer_order_id(&self) -> Option<BeerOrderId> {
        self.beer_order_id
    }

    pub fn beer_id(&self) -> Option<BeerId> {
        self.beer.as_ref().map(|b| b.id)
    }

    pub(crate) fn set_beer_order_id(&mut self, beer_order_id: Option<BeerOrderId>) {
        self.beer_order_id = beer_order_id;
    }

    pub fn check_invariants(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::positive(&mut errors, "orderQuantity", self.order_quantity);
        validation::positive_or_zero(&mut errors, "quantityAllocated", self.quantity_allocated);
        errors.into_result()
    }
}
