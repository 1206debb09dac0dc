use std::collections::HashMap;

use async_trait::async_trait;
use common::{BeerId, BeerOrderId, CustomerId, Page, PageRequest, ShipmentId};
use domain::{Beer, BeerOrder, BeerOrderShipment, BeerRef, Customer};

use crate::{BeerFilter, Result};

/// Persistence of the beer catalog.
///
/// `save_*` inserts when the entity has no id and updates otherwise. Updates
/// are checked against the entity's version (optimistic locking); the saved
/// entity is returned with its store-assigned id, version and timestamps.
#[async_trait]
pub trait BeerRepository: Send + Sync {
    /// Lists beers matching `filter`, ordered by id.
    async fn find_all_beers(&self, filter: &BeerFilter, page: PageRequest) -> Result<Page<Beer>>;

    async fn find_beer_by_id(&self, id: BeerId) -> Result<Option<Beer>>;

    async fn save_beer(&self, beer: Beer) -> Result<Beer>;

    /// Deletes a beer. Returns `false` if it did not exist.
    ///
    /// Fails with `Referenced` while an order line still points at the beer.
    async fn delete_beer_by_id(&self, id: BeerId) -> Result<bool>;

    async fn exists_beer_by_id(&self, id: BeerId) -> Result<bool>;
}

/// Persistence of customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_all_customers(&self, page: PageRequest) -> Result<Page<Customer>>;

    async fn find_customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>>;

    async fn save_customer(&self, customer: Customer) -> Result<Customer>;

    /// Deletes a customer, clearing the customer reference of its orders.
    /// Returns `false` if it did not exist.
    async fn delete_customer_by_id(&self, id: CustomerId) -> Result<bool>;

    async fn exists_customer_by_id(&self, id: CustomerId) -> Result<bool>;
}

/// Persistence of whole beer order aggregates.
#[async_trait]
pub trait BeerOrderRepository: Send + Sync {
    async fn find_all_orders(&self, page: PageRequest) -> Result<Page<BeerOrder>>;

    /// Loads the order together with its lines (and their beers) and shipments.
    async fn find_order_by_id(&self, id: BeerOrderId) -> Result<Option<BeerOrder>>;

    async fn find_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<BeerOrder>>;

    /// Saves the aggregate atomically.
    ///
    /// Persisted lines no longer attached to the order are deleted, new lines
    /// are inserted and the rest updated. New shipments are inserted and
    /// attached ones updated; shipments are only ever deleted by id.
    async fn save_order(&self, order: BeerOrder) -> Result<BeerOrder>;

    /// Deletes the order with its lines and shipments.
    /// Returns `false` if it did not exist.
    async fn delete_order_by_id(&self, id: BeerOrderId) -> Result<bool>;

    async fn exists_order_by_id(&self, id: BeerOrderId) -> Result<bool>;
}

/// Direct access to shipments by their own id.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Shipments of an order, ordered by id.
    async fn find_shipments_by_order(&self, order_id: BeerOrderId)
    -> Result<Vec<BeerOrderShipment>>;

    async fn find_shipment_by_id(&self, id: ShipmentId) -> Result<Option<BeerOrderShipment>>;

    /// Saves one shipment. The shipment must be attached to an order.
    async fn save_shipment(&self, shipment: BeerOrderShipment) -> Result<BeerOrderShipment>;

    async fn delete_shipment_by_id(&self, id: ShipmentId) -> Result<bool>;
}

/// Extension trait providing convenience methods for beer repositories.
#[async_trait]
pub trait BeerRepositoryExt: BeerRepository {
    /// Resolves each id to a beer reference, skipping ids that do not exist.
    async fn find_beer_refs(&self, ids: &[BeerId]) -> Result<HashMap<BeerId, BeerRef>> {
        let mut refs = HashMap::with_capacity(ids.len());
        for &id in ids {
            if refs.contains_key(&id) {
                continue;
            }
            if let Some(beer_ref) = self
                .find_beer_by_id(id)
                .await?
                .as_ref()
                .and_then(BeerRef::of)
            {
                refs.insert(id, beer_ref);
            }
        }
        Ok(refs)
    }
}

// Blanket implementation for all BeerRepository implementations
impl<T: BeerRepository + ?Sized> BeerRepositoryExt for T {}

/// Every repository the services need, behind one cloneable handle.
pub trait Store:
    BeerRepository + CustomerRepository + BeerOrderRepository + ShipmentRepository + Clone + 'static
{
}

impl<T> Store for T where
    T: BeerRepository
        + CustomerRepository
        + BeerOrderRepository
        + ShipmentRepository
        + Clone
        + 'static
{
}
