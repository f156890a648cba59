pub mod addresses;
pub mod balance;
pub mod error;
pub mod sync;

pub use addresses::AddressService;
pub use balance::BalanceCalculator;
pub use error::ServiceError;
pub use sync::{classify, SyncReport, SyncSummary, Synchronizer, CONFIRMED_SENTINEL};
