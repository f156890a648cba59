pub mod api;
pub mod blockchain;
pub mod config;
pub mod db;
pub mod models;
pub mod service;
pub mod state;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use blockchain::{BlockchairClient, ClientError, LedgerSource, RawEvent};
pub use config::Config;
pub use models::{Balance, LedgerRecord, TrackedAddress};
pub use service::{AddressService, BalanceCalculator, ServiceError, Synchronizer};
pub use state::AppState;
pub use store::{AddressRegistry, MemoryStore, SqliteStore, StoreError, TransactionStore};
pub use validation::{Page, ValidationError};
