use crate::models::Balance;
use crate::service::ServiceError;
use crate::store::{AddressRegistry, StoreError, TransactionStore};
use std::sync::Arc;

/// Derives balances from stored records on every call. Nothing is cached, so
/// the result always matches the current contents of the store.
#[derive(Clone)]
pub struct BalanceCalculator {
    registry: Arc<dyn AddressRegistry>,
    store: Arc<dyn TransactionStore>,
}

impl BalanceCalculator {
    pub fn new(registry: Arc<dyn AddressRegistry>, store: Arc<dyn TransactionStore>) -> Self {
        Self { registry, store }
    }

    pub async fn balance_of(&self, address: &str) -> Result<Balance, ServiceError> {
        if self.registry.get_address(address).await?.is_none() {
            return Err(ServiceError::NotFound(address.to_string()));
        }

        let confirmed = self.store.aggregate(address, true).await?;
        let unconfirmed = self.store.aggregate(address, false).await?;

        Balance::from_parts(address, confirmed, unconfirmed)
            .ok_or_else(|| StoreError::AmountOverflow(address.to_string()).into())
    }
}
