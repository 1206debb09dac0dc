use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    BeerId, BeerOrderId, BeerOrderLineId, CustomerId, Money, Page, PageRequest, ShipmentId,
    Version,
};
use domain::{
    Audit, Beer, BeerOrder, BeerOrderLine, BeerOrderShipment, BeerRef, Customer, OrderStatus,
};
use tokio::sync::RwLock;

use crate::{
    BeerFilter, Result, StoreError,
    repository::{BeerOrderRepository, BeerRepository, CustomerRepository, ShipmentRepository},
};

#[derive(Debug, Clone)]
struct OrderRow {
    audit: Audit,
    customer_id: Option<CustomerId>,
    customer_ref: Option<String>,
    payment_amount: Money,
    status: OrderStatus,
}

#[derive(Debug, Clone)]
struct LineRow {
    audit: Audit,
    beer_order_id: BeerOrderId,
    beer_id: Option<BeerId>,
    order_quantity: i32,
    quantity_allocated: i32,
    status: Option<String>,
}

#[derive(Debug, Default)]
struct Sequences {
    beer: i64,
    customer: i64,
    order: i64,
    line: i64,
    shipment: i64,
}

fn next(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

#[derive(Debug, Default)]
struct Tables {
    beers: BTreeMap<BeerId, Beer>,
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<BeerOrderId, OrderRow>,
    lines: BTreeMap<BeerOrderLineId, LineRow>,
    shipments: BTreeMap<ShipmentId, BeerOrderShipment>,
    sequences: Sequences,
}

impl Tables {
    fn beer_ref(&self, beer_id: BeerId) -> Option<BeerRef> {
        self.beers.get(&beer_id).and_then(BeerRef::of)
    }

    fn load_order(&self, id: BeerOrderId) -> Option<BeerOrder> {
        let row = self.orders.get(&id)?;
        let lines = self
            .lines
            .iter()
            .filter(|(_, line)| line.beer_order_id == id)
            .map(|(&line_id, line)| {
                BeerOrderLine::restore(
                    line_id,
                    line.audit,
                    line.beer_id.and_then(|beer_id| self.beer_ref(beer_id)),
                    line.order_quantity,
                    line.quantity_allocated,
                    line.status.clone(),
                )
            })
            .collect();
        let shipments = self
            .shipments
            .values()
            .filter(|s| s.belongs_to(id))
            .cloned()
            .collect();

        Some(BeerOrder::restore(
            id,
            row.audit,
            row.customer_id,
            row.customer_ref.clone(),
            row.payment_amount,
            row.status,
            lines,
            shipments,
        ))
    }

    fn owns_line(&self, order_id: Option<BeerOrderId>, line_id: BeerOrderLineId) -> bool {
        order_id.is_some_and(|order_id| {
            self.lines
                .get(&line_id)
                .is_some_and(|row| row.beer_order_id == order_id)
        })
    }

    fn owns_shipment(&self, order_id: Option<BeerOrderId>, shipment_id: ShipmentId) -> bool {
        order_id.is_some_and(|order_id| {
            self.shipments
                .get(&shipment_id)
                .is_some_and(|s| s.belongs_to(order_id))
        })
    }
}

fn check_version(entity: &'static str, id: i64, expected: Version, actual: Version) -> Result<()> {
    if expected != actual {
        return Err(StoreError::version_conflict(entity, id, expected, actual));
    }
    Ok(())
}

/// In-memory store implementation for testing and for running without a database.
///
/// Rows live in per-table maps behind one lock, so every aggregate write is
/// atomic with respect to other callers.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored order lines across all orders.
    pub async fn line_count(&self) -> usize {
        self.tables.read().await.lines.len()
    }
}

#[async_trait]
impl BeerRepository for InMemoryStore {
    async fn find_all_beers(&self, filter: &BeerFilter, page: PageRequest) -> Result<Page<Beer>> {
        let tables = self.tables.read().await;
        let matching = tables
            .beers
            .values()
            .filter(|beer| beer.matches(filter.name_text(), filter.style_text()))
            .cloned()
            .collect();
        Ok(Page::from_all(matching, page))
    }

    async fn find_beer_by_id(&self, id: BeerId) -> Result<Option<Beer>> {
        Ok(self.tables.read().await.beers.get(&id).cloned())
    }

    async fn save_beer(&self, mut beer: Beer) -> Result<Beer> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let id = match beer.id {
            None => {
                beer.audit = Audit::inserted(now);
                BeerId::new(next(&mut tables.sequences.beer))
            }
            Some(id) => {
                let stored = tables.beers.get(&id).ok_or(StoreError::NotFound {
                    entity: "Beer",
                    id: id.as_i64(),
                })?;
                check_version("Beer", id.as_i64(), beer.audit.version, stored.audit.version)?;
                beer.audit = stored.audit.updated(now);
                id
            }
        };

        beer.id = Some(id);
        tables.beers.insert(id, beer.clone());
        Ok(beer)
    }

    async fn delete_beer_by_id(&self, id: BeerId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.beers.contains_key(&id) {
            return Ok(false);
        }
        if tables.lines.values().any(|line| line.beer_id == Some(id)) {
            return Err(StoreError::Referenced {
                entity: "Beer",
                id: id.as_i64(),
                referenced_by: "BeerOrderLine",
            });
        }
        Ok(tables.beers.remove(&id).is_some())
    }

    async fn exists_beer_by_id(&self, id: BeerId) -> Result<bool> {
        Ok(self.tables.read().await.beers.contains_key(&id))
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn find_all_customers(&self, page: PageRequest) -> Result<Page<Customer>> {
        let tables = self.tables.read().await;
        Ok(Page::from_all(
            tables.customers.values().cloned().collect(),
            page,
        ))
    }

    async fn find_customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn save_customer(&self, mut customer: Customer) -> Result<Customer> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let id = match customer.id {
            None => {
                customer.audit = Audit::inserted(now);
                CustomerId::new(next(&mut tables.sequences.customer))
            }
            Some(id) => {
                let stored = tables.customers.get(&id).ok_or(StoreError::NotFound {
                    entity: "Customer",
                    id: id.as_i64(),
                })?;
                check_version(
                    "Customer",
                    id.as_i64(),
                    customer.audit.version,
                    stored.audit.version,
                )?;
                customer.audit = stored.audit.updated(now);
                id
            }
        };

        customer.id = Some(id);
        tables.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn delete_customer_by_id(&self, id: CustomerId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.customers.remove(&id).is_none() {
            return Ok(false);
        }
        for order in tables.orders.values_mut() {
            if order.customer_id == Some(id) {
                order.customer_id = None;
            }
        }
        Ok(true)
    }

    async fn exists_customer_by_id(&self, id: CustomerId) -> Result<bool> {
        Ok(self.tables.read().await.customers.contains_key(&id))
    }
}

#[async_trait]
impl BeerOrderRepository for InMemoryStore {
    async fn find_all_orders(&self, page: PageRequest) -> Result<Page<BeerOrder>> {
        let tables = self.tables.read().await;
        let orders = tables
            .orders
            .keys()
            .filter_map(|&id| tables.load_order(id))
            .collect();
        Ok(Page::from_all(orders, page))
    }

    async fn find_order_by_id(&self, id: BeerOrderId) -> Result<Option<BeerOrder>> {
        Ok(self.tables.read().await.load_order(id))
    }

    async fn find_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<BeerOrder>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|(_, row)| row.customer_id == Some(customer_id))
            .filter_map(|(&id, _)| tables.load_order(id))
            .collect())
    }

    async fn save_order(&self, mut order: BeerOrder) -> Result<BeerOrder> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        // Check every reference before touching any table.
        if let Some(customer_id) = order.customer_id()
            && !tables.customers.contains_key(&customer_id)
        {
            return Err(StoreError::MissingReference { entity: "Customer" });
        }
        for line in order.lines() {
            if let Some(beer_id) = line.beer_id()
                && !tables.beers.contains_key(&beer_id)
            {
                return Err(StoreError::MissingReference { entity: "Beer" });
            }
            if let Some(line_id) = line.id
                && !tables.owns_line(order.id(), line_id)
            {
                return Err(StoreError::NotFound {
                    entity: "BeerOrderLine",
                    id: line_id.as_i64(),
                });
            }
        }
        for shipment in order.shipments() {
            if let Some(shipment_id) = shipment.id
                && !tables.owns_shipment(order.id(), shipment_id)
            {
                return Err(StoreError::NotFound {
                    entity: "BeerOrderShipment",
                    id: shipment_id.as_i64(),
                });
            }
        }

        let (order_id, audit) = match order.id() {
            None => (
                BeerOrderId::new(next(&mut tables.sequences.order)),
                Audit::inserted(now),
            ),
            Some(id) => {
                let stored = tables.orders.get(&id).ok_or(StoreError::NotFound {
                    entity: "BeerOrder",
                    id: id.as_i64(),
                })?;
                check_version(
                    "BeerOrder",
                    id.as_i64(),
                    order.audit().version,
                    stored.audit.version,
                )?;
                (id, stored.audit.updated(now))
            }
        };

        order.assign_identity(order_id, audit);
        tables.orders.insert(
            order_id,
            OrderRow {
                audit,
                customer_id: order.customer_id(),
                customer_ref: order.customer_ref().map(str::to_string),
                payment_amount: order.payment_amount(),
                status: order.status(),
            },
        );

        // Orphan removal
        let attached: HashSet<BeerOrderLineId> = order.lines().iter().filter_map(|l| l.id).collect();
        let before = tables.lines.len();
        tables
            .lines
            .retain(|id, row| row.beer_order_id != order_id || attached.contains(id));
        let orphans_removed = before - tables.lines.len();

        for line in order.lines_mut() {
            let (line_id, line_audit) = match line.id {
                Some(id) => {
                    let previous = tables.lines.get(&id).map(|row| row.audit).unwrap_or_default();
                    (id, previous.updated(now))
                }
                None => (
                    BeerOrderLineId::new(next(&mut tables.sequences.line)),
                    Audit::inserted(now),
                ),
            };
            line.id = Some(line_id);
            line.audit = line_audit;
            tables.lines.insert(
                line_id,
                LineRow {
                    audit: line_audit,
                    beer_order_id: order_id,
                    beer_id: line.beer_id(),
                    order_quantity: line.order_quantity,
                    quantity_allocated: line.quantity_allocated,
                    status: line.status.clone(),
                },
            );
        }

        // Stored shipments are only written through save_shipment.
        for shipment in order.shipments_mut() {
            match shipment.id {
                Some(id) => {
                    if let Some(stored) = tables.shipments.get(&id) {
                        *shipment = stored.clone();
                    }
                }
                None => {
                    let shipment_id = ShipmentId::new(next(&mut tables.sequences.shipment));
                    shipment.id = Some(shipment_id);
                    shipment.audit = Audit::inserted(now);
                    tables.shipments.insert(shipment_id, shipment.clone());
                }
            }
        }

        tracing::debug!(%order_id, lines = order.lines().len(), orphans_removed, "saved beer order");
        Ok(order)
    }

    async fn delete_order_by_id(&self, id: BeerOrderId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&id).is_none() {
            return Ok(false);
        }
        tables.lines.retain(|_, line| line.beer_order_id != id);
        tables.shipments.retain(|_, s| !s.belongs_to(id));
        Ok(true)
    }

    async fn exists_order_by_id(&self, id: BeerOrderId) -> Result<bool> {
        Ok(self.tables.read().await.orders.contains_key(&id))
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryStore {
    async fn find_shipments_by_order(
        &self,
        order_id: BeerOrderId,
    ) -> Result<Vec<BeerOrderShipment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .shipments
            .values()
            .filter(|s| s.belongs_to(order_id))
            .cloned()
            .collect())
    }

    async fn find_shipment_by_id(&self, id: ShipmentId) -> Result<Option<BeerOrderShipment>> {
        Ok(self.tables.read().await.shipments.get(&id).cloned())
    }

    async fn save_shipment(&self, mut shipment: BeerOrderShipment) -> Result<BeerOrderShipment> {
        let order_id = shipment.beer_order_id().ok_or(StoreError::Detached {
            entity: "BeerOrderShipment",
        })?;

        let mut tables = self.tables.write().await;
        let now = Utc::now();
        if !tables.orders.contains_key(&order_id) {
            return Err(StoreError::MissingReference {
                entity: "BeerOrder",
            });
        }

        let id = match shipment.id {
            None => {
                shipment.audit = Audit::inserted(now);
                ShipmentId::new(next(&mut tables.sequences.shipment))
            }
            Some(id) => {
                let stored = tables
                    .shipments
                    .get(&id)
                    .filter(|s| s.belongs_to(order_id))
                    .ok_or(StoreError::NotFound {
                        entity: "BeerOrderShipment",
                        id: id.as_i64(),
                    })?;
                check_version(
                    "BeerOrderShipment",
                    id.as_i64(),
                    shipment.audit.version,
                    stored.audit.version,
                )?;
                shipment.audit = stored.audit.updated(now);
                id
            }
        };

        shipment.id = Some(id);
        tables.shipments.insert(id, shipment.clone());
        Ok(shipment)
    }

    async fn delete_shipment_by_id(&self, id: ShipmentId) -> Result<bool> {
        Ok(self.tables.write().await.shipments.remove(&id).is_some())
    }
}
