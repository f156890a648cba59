//! Persistence contracts for tracked addresses and their ledger records.
//!
//! The sync engine and the balance calculator only see these traits, so they
//! run the same way against [`SqliteStore`] and the in-memory [`MemoryStore`].

pub mod memory;
pub mod sqlite;

use crate::models::{LedgerRecord, NewLedgerRecord, TrackedAddress};
use crate::validation::Page;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("address already tracked: {0}")]
    AddressExists(String),

    #[error("address not tracked: {0}")]
    AddressNotFound(String),

    #[error("amount sum overflowed for address: {0}")]
    AmountOverflow(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What an upsert did to the row behind its (hash, address) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// The row existed and its confirmation data changed.
    Updated,
    Unchanged,
}

/// Tracked addresses and their sync watermark.
#[async_trait]
pub trait AddressRegistry: Send + Sync {
    /// Fails with [`StoreError::AddressExists`] if the address is already registered.
    async fn insert_address(
        &self,
        address: &str,
        label: Option<&str>,
    ) -> Result<TrackedAddress, StoreError>;

    /// Removes the address and every ledger record attached to it.
    async fn remove_address(&self, address: &str) -> Result<(), StoreError>;

    async fn get_address(&self, address: &str) -> Result<Option<TrackedAddress>, StoreError>;

    /// Newest registrations first.
    async fn list_addresses(&self) -> Result<Vec<TrackedAddress>, StoreError>;

    /// Returns false if the address is no longer tracked.
    async fn mark_synced(&self, address: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;
}

/// Canonical ledger records, unique on (hash, address).
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fails with [`StoreError::AddressNotFound`] if the record's address is not tracked.
    async fn upsert(&self, record: &NewLedgerRecord) -> Result<UpsertOutcome, StoreError>;

    async fn exists(&self, hash: &str, address: &str) -> Result<bool, StoreError>;

    /// Newest first; ties broken by insertion order, newest first.
    async fn list_by_address(
        &self,
        address: &str,
        page: Page,
    ) -> Result<Vec<LedgerRecord>, StoreError>;

    async fn count_by_address(&self, address: &str) -> Result<i64, StoreError>;

    async fn aggregate(&self, address: &str, confirmed: bool) -> Result<i64, StoreError>;
}
