// Blockchair wire types and their conversion into ledger events.

use crate::blockchain::client::ClientError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One ledger event for an address, as reported upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    /// Net effect on the address in satoshis.
    pub balance_delta: i64,
    /// 0 while the transaction is not in a block.
    pub block_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DashboardResponse {
    pub data: HashMap<String, AddressDashboard>,
}

#[derive(Debug, Deserialize)]
pub struct AddressDashboard {
    #[serde(default)]
    pub transactions: Vec<DashboardTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardTransaction {
    pub block_id: i64,
    pub hash: String,
    #[serde(deserialize_with = "deserialize_blockchair_time")]
    pub time: DateTime<Utc>,
    pub balance_change: i64,
}

impl From<DashboardTransaction> for RawEvent {
    fn from(tx: DashboardTransaction) -> Self {
        Self {
            hash: tx.hash,
            timestamp: tx.time,
            balance_delta: tx.balance_change,
            // Mempool transactions come back with block_id = -1
            block_id: tx.block_id.max(0),
        }
    }
}

/// Decode a dashboard body into the events for `address`.
pub fn parse_dashboard(address: &str, body: &[u8]) -> Result<Vec<RawEvent>, ClientError> {
    let response: DashboardResponse =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    let mut data = response.data;
    let dashboard = data
        .remove(address)
        .ok_or_else(|| ClientError::Decode(format!("address {} missing from response", address)))?;

    Ok(dashboard
        .transactions
        .into_iter()
        .map(RawEvent::from)
        .collect())
}

// Blockchair sends "YYYY-MM-DD HH:MM:SS" in UTC; RFC 3339 is accepted as well.
fn deserialize_blockchair_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
