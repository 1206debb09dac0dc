use common::{CustomerId, Page, PageRequest, Version};
use domain::{BeerOrder, Customer, CustomerFields, CustomerPatch};
use store::Store;

use crate::error::{Result, ServiceError, check_version};

/// Service for customers.
#[derive(Clone)]
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_customers(&self, page: PageRequest) -> Result<Page<Customer>> {
        Ok(self.store.find_all_customers(page).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .find_customer_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_customer(&self, fields: CustomerFields) -> Result<Customer> {
        let saved = self.store.save_customer(Customer::new(fields)?).await?;
        if let Some(id) = saved.id {
            tracing::info!(customer_id = %id, "customer created");
        }
        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        fields: CustomerFields,
        expected_version: Option<Version>,
    ) -> Result<Customer> {
        let mut customer = self.get_customer(id).await?;
        check_version(
            "Customer",
            id.as_i64(),
            expected_version,
            customer.audit.version,
        )?;
        customer.replace(fields)?;
        Ok(self.store.save_customer(customer).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn patch_customer(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
        expected_version: Option<Version>,
    ) -> Result<Customer> {
        let mut customer = self.get_customer(id).await?;
        check_version(
            "Customer",
            id.as_i64(),
            expected_version,
            customer.audit.version,
        )?;
        customer.apply_patch(patch)?;
        Ok(self.store.save_customer(customer).await?)
    }

    /// Deletes the customer. Its orders are kept without a customer.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        if !self.store.delete_customer_by_id(id).await? {
            return Err(ServiceError::not_found("Customer", id));
        }
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn orders_of_customer(&self, id: CustomerId) -> Result<Vec<BeerOrder>> {
        if !self.store.exists_customer_by_id(id).await? {
            return Err(ServiceError::not_found("Customer", id));
        }
        Ok(self.store.find_orders_by_customer(id).await?)
    }
}
