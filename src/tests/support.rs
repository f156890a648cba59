//! Shared fixtures: a scripted ledger source and prebuilt app states.

use crate::{
    blockchain::{ClientError, LedgerSource, RawEvent},
    config::Config,
    state::AppState,
    store::MemoryStore,
    validation::is_valid_bitcoin_address,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADDRESS_A: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
pub const ADDRESS_B: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";
pub const ADDRESS_C: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

/// Base time for fixtures: 2023-07-24T00:00:00Z.
const BASE_TIME: i64 = 1_690_156_800;

pub fn event(hash: &str, delta: i64, block_id: i64) -> RawEvent {
    event_at(hash, delta, block_id, 0)
}

pub fn event_at(hash: &str, delta: i64, block_id: i64, offset_secs: i64) -> RawEvent {
    RawEvent {
        hash: hash.to_string(),
        timestamp: at(offset_secs),
        balance_delta: delta,
        block_id,
    }
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIME + offset_secs, 0).unwrap()
}

/// The three events from the reference scenario: two confirmed, one pending.
pub fn scenario_events() -> Vec<RawEvent> {
    vec![
        event_at("h1", 500_000_000, 800_000, 300),
        event_at("h2", -200_000_000, 800_010, 200),
        event_at("h3", 100_000_000, 0, 100),
    ]
}

enum Script {
    Events(Vec<RawEvent>),
    Fail,
}

/// Ledger source answering from a per-address script. Unscripted addresses
/// have no activity.
#[derive(Default)]
pub struct FakeLedgerSource {
    scripts: Mutex<HashMap<String, Script>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeLedgerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_events(&self, address: &str, events: Vec<RawEvent>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), Script::Events(events));
    }

    pub fn fail(&self, address: &str) {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), Script::Fail);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerSource for FakeLedgerSource {
    fn validate_format(&self, address: &str) -> bool {
        is_valid_bitcoin_address(address)
    }

    async fn fetch_recent_events(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripts = self.scripts.lock().unwrap();
        match scripts.get(address) {
            Some(Script::Events(events)) => Ok(events.iter().take(limit).cloned().collect()),
            Some(Script::Fail) => Err(ClientError::Status(503)),
            None => Ok(Vec::new()),
        }
    }
}

/// App state over an in-memory store and the given source.
pub fn memory_state(source: Arc<FakeLedgerSource>) -> (Arc<MemoryStore>, AppState) {
    memory_state_with(Config::default(), source)
}

pub fn memory_state_with(
    config: Config,
    source: Arc<FakeLedgerSource>,
) -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone(), store.clone(), source);
    (store, state)
}
