//! In-process store with the same uniqueness, cascade and ordering rules as
//! the SQLite schema. Used to exercise the sync engine without a database.

use crate::models::{LedgerRecord, NewLedgerRecord, TrackedAddress};
use crate::store::{AddressRegistry, StoreError, TransactionStore, UpsertOutcome};
use crate::validation::Page;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_address_id: i64,
    next_record_id: i64,
    addresses: BTreeMap<String, TrackedAddress>,
    // Keyed on (hash, address)
    records: BTreeMap<(String, String), LedgerRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRegistry for MemoryStore {
    async fn insert_address(
        &self,
        address: &str,
        label: Option<&str>,
    ) -> Result<TrackedAddress, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.addresses.contains_key(address) {
            return Err(StoreError::AddressExists(address.to_string()));
        }

        inner.next_address_id += 1;
        let tracked = TrackedAddress {
            id: inner.next_address_id,
            address: address.to_string(),
            label: label.map(str::to_string),
            created_at: Utc::now(),
            last_synced: None,
        };
        inner.addresses.insert(address.to_string(), tracked.clone());

        Ok(tracked)
    }

    async fn remove_address(&self, address: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.addresses.remove(address).is_none() {
            return Err(StoreError::AddressNotFound(address.to_string()));
        }
        inner.records.retain(|(_, owner), _| owner != address);

        Ok(())
    }

    async fn get_address(&self, address: &str) -> Result<Option<TrackedAddress>, StoreError> {
        Ok(self.inner.lock().await.addresses.get(address).cloned())
    }

    async fn list_addresses(&self) -> Result<Vec<TrackedAddress>, StoreError> {
        let inner = self.inner.lock().await;
        let mut addresses: Vec<_> = inner.addresses.values().cloned().collect();
        addresses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(addresses)
    }

    async fn mark_synced(&self, address: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(match inner.addresses.get_mut(address) {
            Some(tracked) => {
                tracked.last_synced = Some(at);
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn upsert(&self, record: &NewLedgerRecord) -> Result<UpsertOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.addresses.contains_key(&record.address) {
            return Err(StoreError::AddressNotFound(record.address.clone()));
        }

        let key = (record.hash.clone(), record.address.clone());
        if let Some(existing) = inner.records.get_mut(&key) {
            if existing.confirmations == record.confirmations
                && existing.block_height == record.block_height
            {
                return Ok(UpsertOutcome::Unchanged);
            }
            existing.confirmations = record.confirmations;
            existing.block_height = record.block_height;
            return Ok(UpsertOutcome::Updated);
        }

        inner.next_record_id += 1;
        let stored = LedgerRecord {
            id: inner.next_record_id,
            hash: record.hash.clone(),
            address: record.address.clone(),
            amount: record.amount,
            confirmations: record.confirmations,
            block_height: record.block_height,
            timestamp: record.timestamp,
            direction: record.direction,
        };
        inner.records.insert(key, stored);

        Ok(UpsertOutcome::Inserted)
    }

    async fn exists(&self, hash: &str, address: &str) -> Result<bool, StoreError> {
        let key = (hash.to_string(), address.to_string());
        Ok(self.inner.lock().await.records.contains_key(&key))
    }

    async fn list_by_address(
        &self,
        address: &str,
        page: Page,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let mut records: Vec<_> = inner
            .records
            .values()
            .filter(|r| r.address == address)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_by_address(&self, address: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.records.values().filter(|r| r.address == address).count() as i64)
    }

    async fn aggregate(&self, address: &str, confirmed: bool) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .records
            .values()
            .filter(|r| r.address == address && (r.confirmations >= 1) == confirmed)
            .try_fold(0i64, |sum, r| sum.checked_add(r.amount))
            .ok_or_else(|| StoreError::AmountOverflow(address.to_string()))
    }
}
