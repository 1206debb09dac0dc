use common::{BeerId, Page, PageRequest, Version};
use domain::{Beer, BeerFields, BeerPatch};
use store::{BeerFilter, Store};

use crate::error::{Result, ServiceError, check_version};

/// Service for the beer catalog.
#[derive(Clone)]
pub struct BeerService<S: Store> {
    store: S,
}

impl<S: Store> BeerService<S> {
    /// Creates a new beer service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_beers(&self, filter: &BeerFilter, page: PageRequest) -> Result<Page<Beer>> {
        Ok(self.store.find_all_beers(filter, page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_beer(&self, id: BeerId) -> Result<Beer> {
        self.store
            .find_beer_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Beer", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_beer(&self, fields: BeerFields) -> Result<Beer> {
        let saved = self.store.save_beer(Beer::new(fields)?).await?;

        metrics::counter!("beers_created_total").increment(1);
        if let Some(id) = saved.id {
            tracing::info!(beer_id = %id, "beer created");
        }
        Ok(saved)
    }

    /// Replaces every mutable field of the beer.
    #[tracing::instrument(skip(self))]
    pub async fn update_beer(
        &self,
        id: BeerId,
        fields: BeerFields,
        expected_version: Option<Version>,
    ) -> Result<Beer> {
        let mut beer = self.get_beer(id).await?;
        check_version("Beer", id.as_i64(), expected_version, beer.audit.version)?;
        beer.replace(fields)?;
        Ok(self.store.save_beer(beer).await?)
    }

    /// Merges the fields present in `patch` into the stored beer.
    #[tracing::instrument(skip(self))]
    pub async fn patch_beer(
        &self,
        id: BeerId,
        patch: BeerPatch,
        expected_version: Option<Version>,
    ) -> Result<Beer> {
        let mut beer = self.get_beer(id).await?;
        check_version("Beer", id.as_i64(), expected_version, beer.audit.version)?;
        if patch.is_empty() {
            return Ok(beer);
        }
        beer.apply_patch(patch)?;
        Ok(self.store.save_beer(beer).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_beer(&self, id: BeerId) -> Result<()> {
        if !self.store.delete_beer_by_id(id).await? {
            return Err(ServiceError::not_found("Beer", id));
        }
        tracing::info!(beer_id = %id, "beer deleted");
        Ok(())
    }
}
