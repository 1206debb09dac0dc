use std::collections::HashMap;

use common::{BeerId, BeerOrderId, CustomerId, Page, PageRequest, Version};
use domain::{BeerOrder, BeerRef, OrderDraft, UnknownBeerPolicy};
use store::{BeerRepositoryExt, Store};

use crate::error::{Result, ServiceError, check_version};

/// Service for beer orders.
///
/// Creation and full update rebuild the order lines from the draft: every
/// referenced beer is fetched up front, then the aggregate is rebuilt and
/// re-validated before the store persists it in one atomic save.
#[derive(Clone)]
pub struct BeerOrderService<S: Store> {
    store: S,
    policy: UnknownBeerPolicy,
}

impl<S: Store> BeerOrderService<S> {
    /// Creates a new order service with the given unknown-beer policy.
    pub fn new(store: S, policy: UnknownBeerPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> UnknownBeerPolicy {
        self.policy
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, page: PageRequest) -> Result<Page<BeerOrder>> {
        Ok(self.store.find_all_orders(page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: BeerOrderId) -> Result<BeerOrder> {
        self.store
            .find_order_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("BeerOrder", id))
    }

    #[tracing::instrument(skip(self, draft), fields(lines = draft.lines.len()))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<BeerOrder> {
        self.check_customer(draft.customer_id).await?;
        let beers = self.prefetch_beers(&draft).await?;

        let order = BeerOrder::from_draft(&draft, |beer_id| beers.get(&beer_id).cloned(), self.policy)?;
        let saved = self.store.save_order(order).await?;

        metrics::counter!("beer_orders_created_total").increment(1);
        if let Some(id) = saved.id() {
            tracing::info!(order_id = %id, lines = saved.lines().len(), "beer order created");
        }
        Ok(saved)
    }

    /// Overwrites the order's fields and replaces all of its lines.
    /// Shipments are left untouched.
    #[tracing::instrument(skip(self, draft), fields(lines = draft.lines.len()))]
    pub async fn update_order(
        &self,
        id: BeerOrderId,
        draft: OrderDraft,
        expected_version: Option<Version>,
    ) -> Result<BeerOrder> {
        let mut order = self.get_order(id).await?;
        check_version(
            "BeerOrder",
            id.as_i64(),
            expected_version,
            order.audit().version,
        )?;
        self.check_customer(draft.customer_id).await?;
        let beers = self.prefetch_beers(&draft).await?;

        order.apply_update(&draft, |beer_id| beers.get(&beer_id).cloned(), self.policy)?;
        let saved = self.store.save_order(order).await?;

        tracing::info!(order_id = %id, status = %saved.status(), "beer order updated");
        Ok(saved)
    }

    /// Deletes the order together with its lines and shipments.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: BeerOrderId) -> Result<()> {
        if !self.store.delete_order_by_id(id).await? {
            return Err(ServiceError::not_found("BeerOrder", id));
        }
        metrics::counter!("beer_orders_deleted_total").increment(1);
        tracing::info!(order_id = %id, "beer order deleted");
        Ok(())
    }

    async fn check_customer(&self, customer_id: Option<CustomerId>) -> Result<()> {
        if let Some(customer_id) = customer_id
            && !self.store.exists_customer_by_id(customer_id).await?
        {
            return Err(ServiceError::not_found("Customer", customer_id));
        }
        Ok(())
    }

    async fn prefetch_beers(&self, draft: &OrderDraft) -> Result<HashMap<BeerId, BeerRef>> {
        let ids: Vec<BeerId> = draft.lines.iter().filter_map(|line| line.beer_id).collect();
        Ok(self.store.find_beer_refs(&ids).await?)
    }
}
