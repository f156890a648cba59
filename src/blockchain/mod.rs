pub mod client;
pub mod models;
pub mod polling;

use async_trait::async_trait;

pub use client::{BlockchairClient, ClientError};
pub use models::RawEvent;
pub use polling::start_polling;

/// Upstream provider of ledger events for a single address.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Local syntactic check used to reject obviously malformed addresses
    /// before they are registered.
    fn validate_format(&self, address: &str) -> bool;

    /// Up to `limit` of the most recent events for `address`. A response that
    /// cannot be fully decoded is an error; nothing is returned partially.
    async fn fetch_recent_events(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, ClientError>;
}
