use crate::blockchain::{BlockchairClient, ClientError, LedgerSource};
use crate::config::Config;
use crate::db::connection::establish_connection;
use crate::service::{AddressService, Synchronizer};
use crate::store::{AddressRegistry, SqliteStore, TransactionStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("database setup failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ledger client setup failed: {0}")]
    Client(#[from] ClientError),
}

/// Everything the HTTP handlers and the background sync share.
pub struct AppState {
    pub addresses: AddressService,
    pub synchronizer: Arc<Synchronizer>,
    pool: Option<SqlitePool>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<dyn AddressRegistry>,
        store: Arc<dyn TransactionStore>,
        source: Arc<dyn LedgerSource>,
    ) -> Self {
        let synchronizer = Arc::new(Synchronizer::new(
            registry.clone(),
            store.clone(),
            source.clone(),
            config.sync_window,
            config.upstream_budget(),
        ));

        let addresses = AddressService::new(
            registry,
            store,
            source,
            synchronizer.clone(),
            config.page_default_limit,
            config.page_max_limit,
        );

        Self {
            addresses,
            synchronizer,
            pool: None,
        }
    }

    /// Open the SQLite database and the Blockchair client described by `config`.
    pub async fn from_config(config: Config) -> Result<Self, StartupError> {
        let pool = establish_connection(&config.database_url).await?;
        let client = BlockchairClient::from_config(&config)?;
        let store = Arc::new(SqliteStore::new(pool.clone()));

        let mut state = Self::new(config, store.clone(), store, Arc::new(client));
        state.pool = Some(pool);

        Ok(state)
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Database connections closed");
        }
    }
}
