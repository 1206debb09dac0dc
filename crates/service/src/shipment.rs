use common::{BeerOrderId, ShipmentId, Version};
use domain::{BeerOrderShipment, ShipmentDraft};
use store::Store;

use crate::error::{Result, ServiceError, check_version};

/// Service for the shipments of a beer order.
///
/// Shipments are always addressed through their order; one that exists but
/// belongs to a different order is reported as not found.
#[derive(Clone)]
pub struct ShipmentService<S: Store> {
    store: S,
}

impl<S: Store> ShipmentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_shipments(&self, order_id: BeerOrderId) -> Result<Vec<BeerOrderShipment>> {
        if !self.store.exists_order_by_id(order_id).await? {
            return Err(ServiceError::not_found("BeerOrder", order_id));
        }
        Ok(self.store.find_shipments_by_order(order_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        order_id: BeerOrderId,
        shipment_id: ShipmentId,
    ) -> Result<BeerOrderShipment> {
        self.store
            .find_shipment_by_id(shipment_id)
            .await?
            .filter(|shipment| shipment.belongs_to(order_id))
            .ok_or_else(|| ServiceError::not_found("BeerOrderShipment", shipment_id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        order_id: BeerOrderId,
        draft: ShipmentDraft,
    ) -> Result<BeerOrderShipment> {
        let mut order = self
            .store
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("BeerOrder", order_id))?;

        let attached = order.add_shipment(BeerOrderShipment::new(draft)).clone();
        let saved = self.store.save_shipment(attached).await?;

        metrics::counter!("shipments_created_total").increment(1);
        if let Some(id) = saved.id {
            tracing::info!(%order_id, shipment_id = %id, "shipment created");
        }
        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_shipment(
        &self,
        order_id: BeerOrderId,
        shipment_id: ShipmentId,
        draft: ShipmentDraft,
        expected_version: Option<Version>,
    ) -> Result<BeerOrderShipment> {
        let mut shipment = self.get_shipment(order_id, shipment_id).await?;
        check_version(
            "BeerOrderShipment",
            shipment_id.as_i64(),
            expected_version,
            shipment.audit.version,
        )?;
        shipment.update_details(draft);
        Ok(self.store.save_shipment(shipment).await?)
    }

    /// Detaches the shipment from its order and deletes it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_shipment(&self, order_id: BeerOrderId, shipment_id: ShipmentId) -> Result<()> {
        let mut order = self
            .store
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("BeerOrder", order_id))?;

        order
            .remove_shipment(shipment_id)
            .ok_or_else(|| ServiceError::not_found("BeerOrderShipment", shipment_id))?;
        self.store.delete_shipment_by_id(shipment_id).await?;

        tracing::info!(%order_id, %shipment_id, "shipment deleted");
        Ok(())
    }
}
