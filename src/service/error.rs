use crate::blockchain::ClientError;
use crate::store::StoreError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("address already being tracked: {0}")]
    AlreadyTracked(String),

    #[error("address not being tracked: {0}")]
    NotFound(String),

    #[error("failed to fetch transactions from ledger API: {0}")]
    Upstream(#[from] ClientError),

    #[error("storage failure: {0}")]
    Persistence(#[source] sqlx::Error),

    #[error("balance out of range for address: {0}")]
    Overflow(String),

    /// Aggregate failure of a full sync. Individual causes are only logged.
    #[error("sync completed with {failed} errors out of {total} addresses")]
    SyncFailed { failed: usize, total: usize },
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AddressExists(address) => ServiceError::AlreadyTracked(address),
            StoreError::AddressNotFound(address) => ServiceError::NotFound(address),
            StoreError::AmountOverflow(address) => ServiceError::Overflow(address),
            StoreError::Database(e) => ServiceError::Persistence(e),
        }
    }
}
