//! Beer order aggregate implementation.

use common::{BeerId, BeerOrderId, BeerOrderLineId, CustomerId, Money, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::beer::BeerRef;
use crate::error::{DomainError, ValidationErrors};
use crate::validation;

use super::{BeerOrderLine, BeerOrderShipment, OrderLineDraft, OrderStatus, ShipmentDraft};

/// What to do with an order line whose beer id resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownBeerPolicy {
    /// Fail the whole order mutation.
    #[default]
    Reject,
    /// Keep the line without a beer reference.
    Ignore,
}

impl std::str::FromStr for UnknownBeerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnknownBeerPolicy::Reject),
            "ignore" => Ok(UnknownBeerPolicy::Ignore),
            other => Err(format!("unknown beer policy '{other}', expected reject or ignore")),
        }
    }
}

/// A validated request to create or fully update an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: Option<CustomerId>,
    pub customer_ref: Option<String>,
    pub payment_amount: Money,
    pub status: Option<OrderStatus>,
    pub lines: Vec<OrderLineDraft>,
    pub shipments: Vec<ShipmentDraft>,
}

/// Beer order aggregate root.
///
/// Owns its lines and shipments. Every attached child carries the order's
/// identifier as its back-reference; the only way to attach or detach a child
/// is through the `add_*`/`remove_*` methods, which update both sides at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerOrder {
    id: Option<BeerOrderId>,
    audit: Audit,
    customer_id: Option<CustomerId>,
    customer_ref: Option<String>,
    payment_amount: Money,
    status: OrderStatus,
    lines: Vec<BeerOrderLine>,
    shipments: Vec<BeerOrderShipment>,
}

// Construction
impl BeerOrder {
    /// Creates an unsaved order with no children.
    pub fn new(
        customer_id: Option<CustomerId>,
        customer_ref: Option<String>,
        payment_amount: Money,
        status: OrderStatus,
    ) -> Self {
        Self {
            id: None,
            audit: Audit::default(),
            customer_id,
            customer_ref,
            payment_amount,
            status,
            lines: Vec::new(),
            shipments: Vec::new(),
        }
    }

    /// Materializes a new order from a draft.
    ///
    /// Lines are rebuilt through [`BeerOrder::rebuild_lines`] and shipments
    /// attached one by one; the result must satisfy every invariant.
    pub fn from_draft<F>(
        draft: &OrderDraft,
        beer_lookup: F,
        policy: UnknownBeerPolicy,
    ) -> Result<Self, DomainError>
    where
        F: Fn(BeerId) -> Option<BeerRef>,
    {
        let mut order = Self::new(
            draft.customer_id,
            draft.customer_ref.clone(),
            draft.payment_amount,
            draft.status.unwrap_or_default(),
        );
        order.rebuild_lines(&draft.lines, beer_lookup, policy)?;
        for shipment in &draft.shipments {
            order.add_shipment(BeerOrderShipment::new(shipment.clone()));
        }
        order.check_invariants()?;
        Ok(order)
    }

    /// Rebuilds a stored order, attaching the stored children.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: BeerOrderId,
        audit: Audit,
        customer_id: Option<CustomerId>,
        customer_ref: Option<String>,
        payment_amount: Money,
        status: OrderStatus,
        lines: Vec<BeerOrderLine>,
        shipments: Vec<BeerOrderShipment>,
    ) -> Self {
        let mut order = Self::new(customer_id, customer_ref, payment_amount, status);
        order.id = Some(id);
        order.audit = audit;
        for line in lines {
            order.add_line(line);
        }
        for shipment in shipments {
            order.add_shipment(shipment);
        }
        order
    }
}

// Query methods
impl BeerOrder {
    pub fn id(&self) -> Option<BeerOrderId> {
        self.id
    }

    pub fn audit(&self) -> &Audit {
        &self.audit
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn customer_ref(&self) -> Option<&str> {
        self.customer_ref.as_deref()
    }

    pub fn payment_amount(&self) -> Money {
        self.payment_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[BeerOrderLine] {
        &self.lines
    }

    pub fn shipments(&self) -> &[BeerOrderShipment] {
        &self.shipments
    }

    pub fn find_line(&self, line_id: BeerOrderLineId) -> Option<&BeerOrderLine> {
        self.lines.iter().find(|l| l.id == Some(line_id))
    }

    pub fn find_shipment(&self, shipment_id: ShipmentId) -> Option<&BeerOrderShipment> {
        self.shipments.iter().find(|s| s.id == Some(shipment_id))
    }

    /// Beer ids referenced by the lines, without duplicates.
    pub fn referenced_beer_ids(&self) -> Vec<BeerId> {
        let mut ids: Vec<BeerId> = self.lines.iter().filter_map(|l| l.beer_id()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

// Child management
impl BeerOrder {
    /// Attaches `line` to this order and points its back-reference here.
    pub fn add_line(&mut self, mut line: BeerOrderLine) -> &BeerOrderLine {
        line.set_beer_order_id(self.id);
        self.lines.push(line);
        &self.lines[self.lines.len() - 1]
    }

    /// Detaches the line with `line_id` and clears its back-reference.
    ///
    /// Returns `None` (and changes nothing) if no such line is attached.
    pub fn remove_line(&mut self, line_id: BeerOrderLineId) -> Option<BeerOrderLine> {
        let position = self.lines.iter().position(|l| l.id == Some(line_id))?;
        let mut line = self.lines.remove(position);
        line.set_beer_order_id(None);
        Some(line)
    }

    /// Detaches every line, returning them with cleared back-references.
    pub fn clear_lines(&mut self) -> Vec<BeerOrderLine> {
        self.lines
            .drain(..)
            .map(|mut line| {
                line.set_beer_order_id(None);
                line
            })
            .collect()
    }

    /// Attaches `shipment` to this order and points its back-reference here.
    pub fn add_shipment(&mut self, mut shipment: BeerOrderShipment) -> &BeerOrderShipment {
        shipment.set_beer_order_id(self.id);
        self.shipments.push(shipment);
        &self.shipments[self.shipments.len() - 1]
    }

    /// Detaches the shipment with `shipment_id` and clears its back-reference.
    ///
    /// Returns `None` (and changes nothing) if no such shipment is attached.
    pub fn remove_shipment(&mut self, shipment_id: ShipmentId) -> Option<BeerOrderShipment> {
        let position = self
            .shipments
            .iter()
            .position(|s| s.id == Some(shipment_id))?;
        let mut shipment = self.shipments.remove(position);
        shipment.set_beer_order_id(None);
        Some(shipment)
    }

    /// Builds a new line for every draft and attaches it.
    ///
    /// Beers are resolved through `beer_lookup` before anything is attached,
    /// so a rejected draft leaves the order unchanged. Lines created here are
    /// always new rows.
    pub fn rebuild_lines<F>(
        &mut self,
        drafts: &[OrderLineDraft],
        beer_lookup: F,
        policy: UnknownBeerPolicy,
    ) -> Result<(), DomainError>
    where
        F: Fn(BeerId) -> Option<BeerRef>,
    {
        let mut resolved = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let beer = match draft.beer_id.and_then(&beer_lookup) {
                Some(beer) => Some(beer),
                None if policy == UnknownBeerPolicy::Reject => {
                    return Err(match draft.beer_id {
                        Some(beer_id) => DomainError::UnknownBeer { beer_id },
                        None => {
                            let mut errors = ValidationErrors::new();
                            errors.add("beerId", "is required");
                            DomainError::Validation(errors)
                        }
                    });
                }
                None => {
                    tracing::warn!(beer_id = ?draft.beer_id, "order line has no known beer, keeping line without beer");
                    None
                }
            };
            resolved.push(BeerOrderLine::new(beer, draft));
        }

        for line in resolved {
            self.add_line(line);
        }
        Ok(())
    }
}

// Command methods
impl BeerOrder {
    /// Moves the order to `next`, enforcing the status transition table.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Applies a full update: scalar fields are overwritten, the status goes
    /// through the transition table and the lines are replaced by new lines
    /// built from the draft. Existing shipments are kept.
    ///
    /// All-or-nothing: on error the order is unchanged.
    pub fn apply_update<F>(
        &mut self,
        draft: &OrderDraft,
        beer_lookup: F,
        policy: UnknownBeerPolicy,
    ) -> Result<(), DomainError>
    where
        F: Fn(BeerId) -> Option<BeerRef>,
    {
        let mut updated = self.clone();
        updated.customer_id = draft.customer_id;
        updated.customer_ref = draft.customer_ref.clone();
        updated.payment_amount = draft.payment_amount;
        if let Some(status) = draft.status {
            updated.transition_to(status)?;
        }
        updated.clear_lines();
        updated.rebuild_lines(&draft.lines, beer_lookup, policy)?;
        updated.check_invariants()?;

        *self = updated;
        Ok(())
    }

    /// Records the identity and audit columns the store assigned, propagating
    /// the identifier to every attached child.
    pub fn assign_identity(&mut self, id: BeerOrderId, audit: Audit) {
        self.id = Some(id);
        self.audit = audit;
        for line in &mut self.lines {
            line.set_beer_order_id(Some(id));
        }
        for shipment in &mut self.shipments {
            shipment.set_beer_order_id(Some(id));
        }
    }

    /// Mutable access to the attached lines for the store to stamp ids and
    /// audit columns. Membership cannot change through a slice.
    pub fn lines_mut(&mut self) -> &mut [BeerOrderLine] {
        &mut self.lines
    }

    /// See [`BeerOrder::lines_mut`].
    pub fn shipments_mut(&mut self) -> &mut [BeerOrderShipment] {
        &mut self.shipments
    }

    pub fn check_invariants(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::positive_money(&mut errors, "paymentAmount", self.payment_amount);
        if self.lines.is_empty() {
            errors.add(
                "beerOrderLines",
                "beer order must have at least one beer order line",
            );
        }
        for (index, line) in self.lines.iter().enumerate() {
            debug_assert_eq!(line.beer_order_id(), self.id);
            if let Err(line_errors) = line.check_invariants() {
                errors.extend_nested(&format!("beerOrderLines[{index}]"), line_errors);
            }
        }
        errors.into_result()
    }
}
