pub mod address;
pub mod connection;
pub mod migration;
pub mod transaction;

use chrono::{DateTime, Utc};

// Timestamps are stored as unix seconds.
pub(crate) fn to_unix(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
