use crate::blockchain::LedgerSource;
use crate::models::{AddressWithBalance, Balance, LedgerRecord, TrackedAddress};
use crate::service::{BalanceCalculator, ServiceError, Synchronizer};
use crate::store::{AddressRegistry, TransactionStore};
use crate::validation::{Page, ValidationError};
use std::sync::Arc;
use tracing::{info, warn};

/// Registration, removal and read-side queries for tracked addresses.
pub struct AddressService {
    registry: Arc<dyn AddressRegistry>,
    store: Arc<dyn TransactionStore>,
    source: Arc<dyn LedgerSource>,
    synchronizer: Arc<Synchronizer>,
    balances: BalanceCalculator,
    default_limit: i64,
    max_limit: i64,
}

impl AddressService {
    pub fn new(
        registry: Arc<dyn AddressRegistry>,
        store: Arc<dyn TransactionStore>,
        source: Arc<dyn LedgerSource>,
        synchronizer: Arc<Synchronizer>,
        default_limit: i64,
        max_limit: i64,
    ) -> Self {
        let balances = BalanceCalculator::new(registry.clone(), store.clone());
        Self {
            registry,
            store,
            source,
            synchronizer,
            balances,
            default_limit,
            max_limit,
        }
    }

    /// Start tracking `address`. Registering the same address twice is an error.
    pub async fn register(
        &self,
        address: &str,
        label: Option<&str>,
    ) -> Result<TrackedAddress, ServiceError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ValidationError::MissingParameter("address".to_string()).into());
        }
        if !self.source.validate_format(address) {
            return Err(ValidationError::InvalidAddress(address.to_string()).into());
        }

        if self.registry.get_address(address).await?.is_some() {
            return Err(ServiceError::AlreadyTracked(address.to_string()));
        }

        let label = label.map(str::trim).filter(|l| !l.is_empty());
        let tracked = self.registry.insert_address(address, label).await?;
        info!("Added address {} to tracking", address);

        Ok(tracked)
    }

    /// Register, then run a first sync. A failed first sync is logged and the
    /// registration stands; the background sync will pick it up later.
    pub async fn track(
        &self,
        address: &str,
        label: Option<&str>,
    ) -> Result<TrackedAddress, ServiceError> {
        let tracked = self.register(address, label).await?;

        if let Err(e) = self.synchronizer.sync_one(&tracked.address).await {
            warn!("Initial sync failed for address {}: {}", tracked.address, e);
            return Ok(tracked);
        }

        Ok(self
            .registry
            .get_address(&tracked.address)
            .await?
            .unwrap_or(tracked))
    }

    pub async fn remove(&self, address: &str) -> Result<(), ServiceError> {
        self.registry.remove_address(address).await?;
        info!("Removed address {} from tracking", address);
        Ok(())
    }

    pub async fn get(&self, address: &str) -> Result<TrackedAddress, ServiceError> {
        self.registry
            .get_address(address)
            .await?
            .ok_or_else(|| ServiceError::NotFound(address.to_string()))
    }

    pub async fn get_with_balance(&self, address: &str) -> Result<AddressWithBalance, ServiceError> {
        let tracked = self.get(address).await?;
        let balance = self.balances.balance_of(address).await?;

        Ok(AddressWithBalance {
            address: tracked,
            balance,
        })
    }

    /// Every tracked address with its balance, newest registration first.
    pub async fn list_with_balances(&self) -> Result<Vec<AddressWithBalance>, ServiceError> {
        let addresses = self.registry.list_addresses().await?;

        let mut result = Vec::with_capacity(addresses.len());
        for tracked in addresses {
            match self.balances.balance_of(&tracked.address).await {
                Ok(balance) => result.push(AddressWithBalance {
                    address: tracked,
                    balance,
                }),
                // Removed between listing and balance lookup
                Err(ServiceError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    pub async fn balance(&self, address: &str) -> Result<Balance, ServiceError> {
        self.balances.balance_of(address).await
    }

    /// One page of an address's transactions plus the total number stored.
    pub async fn transactions(
        &self,
        address: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Vec<LedgerRecord>, i64), ServiceError> {
        let page = Page::new(limit, offset, self.default_limit, self.max_limit)?;

        if self.registry.get_address(address).await?.is_none() {
            return Err(ServiceError::NotFound(address.to_string()));
        }

        let records = self.store.list_by_address(address, page).await?;
        let total = self.store.count_by_address(address).await?;

        Ok((records, total))
    }
}
