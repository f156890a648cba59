use crate::db::{address, transaction};
use crate::models::{LedgerRecord, NewLedgerRecord, TrackedAddress};
use crate::store::{AddressRegistry, StoreError, TransactionStore, UpsertOutcome};
use crate::validation::Page;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

/// SQLite-backed registry and transaction store sharing one pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_foreign_key_violation())
        .unwrap_or(false)
}

#[async_trait]
impl AddressRegistry for SqliteStore {
    async fn insert_address(
        &self,
        addr: &str,
        label: Option<&str>,
    ) -> Result<TrackedAddress, StoreError> {
        address::insert_address(&self.pool, addr, label, Utc::now())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::AddressExists(addr.to_string())
                } else {
                    StoreError::Database(e)
                }
            })
    }

    async fn remove_address(&self, addr: &str) -> Result<(), StoreError> {
        if address::remove_address(&self.pool, addr).await? {
            Ok(())
        } else {
            Err(StoreError::AddressNotFound(addr.to_string()))
        }
    }

    async fn get_address(&self, addr: &str) -> Result<Option<TrackedAddress>, StoreError> {
        Ok(address::get_address(&self.pool, addr).await?)
    }

    async fn list_addresses(&self) -> Result<Vec<TrackedAddress>, StoreError> {
        Ok(address::list_addresses(&self.pool).await?)
    }

    async fn mark_synced(&self, addr: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(address::update_last_synced(&self.pool, addr, at).await?)
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn upsert(&self, record: &NewLedgerRecord) -> Result<UpsertOutcome, StoreError> {
        let outcome = transaction::upsert_transaction(&self.pool, record)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::AddressNotFound(record.address.clone())
                } else {
                    StoreError::Database(e)
                }
            })?;

        debug!("Upserted {} for {}: {:?}", record.hash, record.address, outcome);
        Ok(outcome)
    }

    async fn exists(&self, hash: &str, addr: &str) -> Result<bool, StoreError> {
        Ok(transaction::transaction_exists(&self.pool, hash, addr).await?)
    }

    async fn list_by_address(
        &self,
        addr: &str,
        page: Page,
    ) -> Result<Vec<LedgerRecord>, StoreError> {
        Ok(transaction::get_transactions(&self.pool, addr, page.limit(), page.offset()).await?)
    }

    async fn count_by_address(&self, addr: &str) -> Result<i64, StoreError> {
        Ok(transaction::count_transactions(&self.pool, addr).await?)
    }

    async fn aggregate(&self, addr: &str, confirmed: bool) -> Result<i64, StoreError> {
        transaction::sum_amounts(&self.pool, addr, confirmed)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.message().contains("integer overflow") => {
                    StoreError::AmountOverflow(addr.to_string())
                }
                e => StoreError::Database(e),
            })
    }
}
