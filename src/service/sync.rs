use crate::blockchain::{ClientError, LedgerSource, RawEvent};
use crate::models::{Direction, NewLedgerRecord};
use crate::service::ServiceError;
use crate::store::{AddressRegistry, TransactionStore, UpsertOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Confirmation count recorded for any event the source placed in a block.
/// Real depth is not computed.
pub const CONFIRMED_SENTINEL: i64 = 6;

/// Turn an upstream event into the record stored for `address`.
pub fn classify(address: &str, event: &RawEvent) -> NewLedgerRecord {
    let confirmations = if event.block_id == 0 {
        0
    } else {
        CONFIRMED_SENTINEL
    };

    NewLedgerRecord {
        hash: event.hash.clone(),
        address: address.to_string(),
        amount: event.balance_delta,
        confirmations,
        block_height: event.block_id,
        timestamp: event.timestamp,
        direction: Direction::from_delta(event.balance_delta),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub address: String,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub addresses: usize,
    pub synced: usize,
    /// Addresses removed while the round was running.
    pub skipped: usize,
    pub inserted: usize,
}

pub struct Synchronizer {
    registry: Arc<dyn AddressRegistry>,
    store: Arc<dyn TransactionStore>,
    source: Arc<dyn LedgerSource>,
    window: usize,
    upstream_budget: Duration,
}

impl Synchronizer {
    pub fn new(
        registry: Arc<dyn AddressRegistry>,
        store: Arc<dyn TransactionStore>,
        source: Arc<dyn LedgerSource>,
        window: usize,
        upstream_budget: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            source,
            window,
            upstream_budget,
        }
    }

    /// Fetch the recent window for one address and ingest it.
    ///
    /// Upstream failures leave the watermark untouched. Re-running over the
    /// same window is safe since ingestion is keyed on (hash, address).
    pub async fn sync_one(&self, address: &str) -> Result<SyncReport, ServiceError> {
        if self.registry.get_address(address).await?.is_none() {
            return Err(ServiceError::NotFound(address.to_string()));
        }

        let fetch = self.source.fetch_recent_events(address, self.window);
        let events = match tokio::time::timeout(self.upstream_budget, fetch).await {
            Ok(result) => result?,
            Err(_) => return Err(ClientError::Timeout(self.upstream_budget).into()),
        };

        let mut inserted = 0;
        let mut updated = 0;
        for event in &events {
            let record = classify(address, event);
            match self.store.upsert(&record).await? {
                UpsertOutcome::Inserted => inserted += 1,
                UpsertOutcome::Updated => updated += 1,
                UpsertOutcome::Unchanged => {}
            }
        }

        let synced_at = Utc::now();
        if !self.registry.mark_synced(address, synced_at).await? {
            debug!("Address {} was removed during sync", address);
        }

        info!("Synced {} new transactions for address {}", inserted, address);
        if updated > 0 {
            debug!("Refreshed confirmations on {} transactions for {}", updated, address);
        }

        Ok(SyncReport {
            address: address.to_string(),
            fetched: events.len(),
            inserted,
            updated,
            synced_at,
        })
    }

    /// Sync every tracked address in turn. One failing address never stops
    /// the rest; the error only reports how many failed.
    pub async fn sync_all(&self) -> Result<SyncSummary, ServiceError> {
        let addresses = self.registry.list_addresses().await?;

        let mut summary = SyncSummary {
            addresses: addresses.len(),
            ..SyncSummary::default()
        };
        let mut failed = 0;

        for tracked in &addresses {
            match self.sync_one(&tracked.address).await {
                Ok(report) => {
                    summary.synced += 1;
                    summary.inserted += report.inserted;
                }
                Err(ServiceError::NotFound(address)) => {
                    debug!("Skipping {}: no longer tracked", address);
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!("Sync failed for {}: {}", tracked.address, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(ServiceError::SyncFailed {
                failed,
                total: summary.addresses,
            });
        }

        Ok(summary)
    }
}
