//! Integration tests for the BeerOrder aggregate.
//!
//! These tests drive the aggregate through the public API only, the way the
//! service and store layers do: draft, identity assignment, full updates,
//! status changes and shipment management.

use chrono::{NaiveDate, Utc};
use common::{BeerId, BeerOrderId, BeerOrderLineId, CustomerId, Money, ShipmentId, Version};
use domain::{
    Audit, BeerOrder, BeerOrderLine, BeerOrderShipment, BeerRef, DomainError, OrderDraft,
    OrderLineDraft, OrderStatus, ShipmentDraft, UnknownBeerPolicy,
};

fn catalog(id: BeerId) -> Option<BeerRef> {
    match id.as_i64() {
        1 => Some(BeerRef {
            id,
            name: "Mango Bobs".to_string(),
            style: "ALE".to_string(),
            upc: "0631234200036".to_string(),
        }),
        2 => Some(BeerRef {
            id,
            name: "Galaxy Cat".to_string(),
            style: "PALE_ALE".to_string(),
            upc: "9122089364369".to_string(),
        }),
        _ => None,
    }
}

fn order_draft(lines: Vec<OrderLineDraft>) -> OrderDraft {
    OrderDraft {
        customer_id: Some(CustomerId::new(3)),
        customer_ref: Some("PO-1001".to_string()),
        payment_amount: Money::from_cents(4500),
        status: None,
        lines,
        shipments: Vec::new(),
    }
}

fn shipment_draft(day: u32) -> ShipmentDraft {
    ShipmentDraft {
        shipment_date: NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap(),
        carrier: Some("DHL".to_string()),
        tracking_number: None,
    }
}

/// Mimics what a store does on insert: assigns ids to the order and its
/// children and stamps fresh audit columns.
fn persist(order: &mut BeerOrder, id: i64) {
    let now = Utc::now();
    order.assign_identity(BeerOrderId::new(id), Audit::inserted(now));
    for (index, line) in order.lines_mut().iter_mut().enumerate() {
        if line.id.is_none() {
            line.id = Some(BeerOrderLineId::new(id * 100 + index as i64));
            line.audit = Audit::inserted(now);
        }
    }
    for (index, shipment) in order.shipments_mut().iter_mut().enumerate() {
        if shipment.id.is_none() {
            shipment.id = Some(ShipmentId::new(id * 100 + index as i64));
            shipment.audit = Audit::inserted(now);
        }
    }
}

mod order_lifecycle {
    use super::*;

    #[test]
    fn complete_order_lifecycle() {
        let mut order = BeerOrder::from_draft(
            &order_draft(vec![
                OrderLineDraft::new(BeerId::new(1), 2),
                OrderLineDraft::new(BeerId::new(2), 1),
            ]),
            catalog,
            UnknownBeerPolicy::Reject,
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::New);
        assert!(order.id().is_none());

        persist(&mut order, 7);
        assert_eq!(order.id(), Some(BeerOrderId::new(7)));
        assert!(
            order
                .lines()
                .iter()
                .all(|line| line.beer_order_id() == Some(BeerOrderId::new(7)))
        );
        assert_eq!(
            order.referenced_beer_ids(),
            vec![BeerId::new(1), BeerId::new(2)]
        );

        for next in [OrderStatus::Paid, OrderStatus::InProcess, OrderStatus::Complete] {
            order.transition_to(next).unwrap();
        }
        assert!(order.status().is_terminal());

        let err = order.transition_to(OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStatusTransition {
                from: OrderStatus::Complete,
                to: OrderStatus::Cancelled,
            }
        ));
    }

    #[test]
    fn cancellation_is_allowed_before_completion() {
        for path in [
            vec![OrderStatus::Cancelled],
            vec![OrderStatus::Paid, OrderStatus::Cancelled],
            vec![OrderStatus::InProcess, OrderStatus::Cancelled],
        ] {
            let mut order = BeerOrder::from_draft(
                &order_draft(vec![OrderLineDraft::new(BeerId::new(1), 1)]),
                catalog,
                UnknownBeerPolicy::Reject,
            )
            .unwrap();
            for next in path {
                order.transition_to(next).unwrap();
            }
            assert_eq!(order.status(), OrderStatus::Cancelled);
        }
    }

    #[test]
    fn draft_shipments_are_attached_on_creation() {
        let mut draft = order_draft(vec![OrderLineDraft::new(BeerId::new(1), 1)]);
        draft.shipments = vec![shipment_draft(1), shipment_draft(2)];

        let mut order = BeerOrder::from_draft(&draft, catalog, UnknownBeerPolicy::Reject).unwrap();
        persist(&mut order, 4);

        assert_eq!(order.shipments().len(), 2);
        assert!(
            order
                .shipments()
                .iter()
                .all(|s| s.belongs_to(BeerOrderId::new(4)))
        );
    }
}

mod full_update {
    use super::*;

    fn stored_order() -> BeerOrder {
        let mut order = BeerOrder::from_draft(
            &order_draft(vec![OrderLineDraft::new(BeerId::new(1), 2)]),
            catalog,
            UnknownBeerPolicy::Reject,
        )
        .unwrap();
        order.add_shipment(BeerOrderShipment::new(shipment_draft(3)));
        persist(&mut order, 9);
        order
    }

    #[test]
    fn update_overwrites_scalars_and_rebuilds_lines() {
        let mut order = stored_order();
        let old_line_id = order.lines()[0].id;

        let mut draft = order_draft(vec![
            OrderLineDraft::new(BeerId::new(2), 6),
            OrderLineDraft::new(BeerId::new(1), 1),
        ]);
        draft.customer_id = None;
        draft.customer_ref = Some("PO-1002".to_string());
        draft.payment_amount = Money::from_cents(9900);
        draft.status = Some(OrderStatus::Paid);

        order
            .apply_update(&draft, catalog, UnknownBeerPolicy::Reject)
            .unwrap();

        assert_eq!(order.customer_id(), None);
        assert_eq!(order.customer_ref(), Some("PO-1002"));
        assert_eq!(order.payment_amount(), Money::from_cents(9900));
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.lines().len(), 2);
        assert!(order.lines().iter().all(|line| line.id.is_none()));
        assert!(order.find_line(old_line_id.unwrap()).is_none());
        assert!(
            order
                .lines()
                .iter()
                .all(|line| line.beer_order_id() == Some(BeerOrderId::new(9)))
        );
        // Shipments survive a full update
        assert_eq!(order.shipments().len(), 1);
    }

    #[test]
    fn rejected_update_leaves_order_untouched() {
        let mut order = stored_order();
        let before = order.clone();

        let result = order.apply_update(
            &order_draft(vec![
                OrderLineDraft::new(BeerId::new(2), 1),
                OrderLineDraft::new(BeerId::new(99), 1),
            ]),
            catalog,
            UnknownBeerPolicy::Reject,
        );

        assert!(matches!(result, Err(DomainError::UnknownBeer { beer_id }) if beer_id == BeerId::new(99)));
        assert_eq!(order, before);
    }

    #[test]
    fn ignore_policy_keeps_line_without_beer() {
        let mut order = stored_order();

        order
            .apply_update(
                &order_draft(vec![OrderLineDraft::new(BeerId::new(99), 4)]),
                catalog,
                UnknownBeerPolicy::Ignore,
            )
            .unwrap();

        assert_eq!(order.lines().len(), 1);
        assert!(order.lines()[0].beer.is_none());
        assert_eq!(order.lines()[0].order_quantity, 4);
        assert!(order.referenced_beer_ids().is_empty());
    }

    #[test]
    fn update_without_lines_is_invalid() {
        let mut order = stored_order();
        let result = order.apply_update(&order_draft(Vec::new()), catalog, UnknownBeerPolicy::Reject);
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(order.lines().len(), 1);
    }
}

mod restore {
    use super::*;

    #[test]
    fn restored_children_point_at_their_order() {
        let now = Utc::now();
        let line = BeerOrderLine::restore(
            BeerOrderLineId::new(11),
            Audit::inserted(now),
            catalog(BeerId::new(1)),
            3,
            1,
            Some("ALLOCATED".to_string()),
        );
        let shipment = BeerOrderShipment::restore(
            ShipmentId::new(21),
            Audit::inserted(now),
            BeerOrderId::new(5),
            shipment_draft(5),
        );

        let order = BeerOrder::restore(
            BeerOrderId::new(5),
            Audit::inserted(now).updated(now),
            None,
            None,
            Money::from_cents(1000),
            OrderStatus::InProcess,
            vec![line],
            vec![shipment],
        );

        assert_eq!(order.audit().version, Version::new(1));
        assert!(order.check_invariants().is_ok());
        let line = order.find_line(BeerOrderLineId::new(11)).unwrap();
        assert_eq!(line.beer_order_id(), Some(BeerOrderId::new(5)));
        assert_eq!(line.quantity_allocated, 1);
        let shipment = order.find_shipment(ShipmentId::new(21)).unwrap();
        assert!(shipment.belongs_to(BeerOrderId::new(5)));
    }

    #[test]
    fn removed_shipment_is_detached() {
        let now = Utc::now();
        let mut order = BeerOrder::restore(
            BeerOrderId::new(5),
            Audit::inserted(now),
            None,
            None,
            Money::from_cents(1000),
            OrderStatus::New,
            vec![BeerOrderLine::restore(
                BeerOrderLineId::new(1),
                Audit::inserted(now),
                None,
                1,
                0,
                None,
            )],
            vec![BeerOrderShipment::restore(
                ShipmentId::new(2),
                Audit::inserted(now),
                BeerOrderId::new(5),
                shipment_draft(6),
            )],
        );

        let removed = order.remove_shipment(ShipmentId::new(2)).unwrap();

        assert_eq!(removed.beer_order_id(), None);
        assert!(order.shipments().is_empty());
        assert!(order.remove_shipment(ShipmentId::new(2)).is_none());
    }
}
