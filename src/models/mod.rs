// Tracked address and ledger record types shared by the store, the sync engine
// and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Satoshis in one bitcoin.
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAddress {
    pub id: i64,
    pub address: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_synced: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    /// Negative balance changes are outgoing, everything else is incoming.
    pub fn from_delta(delta: i64) -> Self {
        if delta < 0 {
            Direction::Sent
        } else {
            Direction::Received
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(Direction::Sent),
            "received" => Some(Direction::Received),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted transaction, as seen from one tracked address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: i64,
    pub hash: String,
    pub address: String,
    /// Signed amount in satoshis.
    pub amount: i64,
    pub confirmations: i64,
    pub block_height: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub direction: Direction,
}

/// A ledger record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerRecord {
    pub hash: String,
    pub address: String,
    pub amount: i64,
    pub confirmations: i64,
    pub block_height: i64,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub address: String,
    pub confirmed_balance: i64,
    pub unconfirmed_balance: i64,
    pub total_balance: i64,
    pub balance_btc: f64,
}

impl Balance {
    /// None if the total does not fit in an i64.
    pub fn from_parts(address: &str, confirmed: i64, unconfirmed: i64) -> Option<Self> {
        let total = confirmed.checked_add(unconfirmed)?;
        Some(Self {
            address: address.to_string(),
            confirmed_balance: confirmed,
            unconfirmed_balance: unconfirmed,
            total_balance: total,
            balance_btc: total as f64 / SATOSHIS_PER_BTC as f64,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddressWithBalance {
    #[serde(flatten)]
    pub address: TrackedAddress,
    pub balance: Balance,
}

// API request models
#[derive(Debug, Deserialize)]
pub struct AddAddressRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_composes_total_and_btc_value() {
        let balance = Balance::from_parts("1abc", 300_000_000, 100_000_000).unwrap();
        assert_eq!(balance.total_balance, 400_000_000);
        assert!((balance.balance_btc - 4.0).abs() < f64::EPSILON);

        assert!(Balance::from_parts("1abc", i64::MAX, 1).is_none());
        assert!(Balance::from_parts("1abc", i64::MIN, -1).is_none());
    }

    #[test]
    fn direction_follows_sign_of_delta() {
        assert_eq!(Direction::from_delta(-1), Direction::Sent);
        assert_eq!(Direction::from_delta(0), Direction::Received);
        assert_eq!(Direction::from_delta(5), Direction::Received);
        assert_eq!(Direction::parse("sent"), Some(Direction::Sent));
        assert_eq!(Direction::parse("bogus"), None);
    }
}
