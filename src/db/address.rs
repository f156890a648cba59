// SQL for the addresses table:
// - insert_address / remove_address
// - get_address / list_addresses (newest first)
// - update_last_synced

use crate::db::{from_unix, to_unix};
use crate::models::TrackedAddress;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub async fn insert_address(
    pool: &Pool<Sqlite>,
    address: &str,
    label: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<TrackedAddress, sqlx::Error> {
    let result = sqlx::query("INSERT INTO addresses (address, label, created_at) VALUES (?, ?, ?)")
        .bind(address)
        .bind(label)
        .bind(to_unix(created_at))
        .execute(pool)
        .await?;

    Ok(TrackedAddress {
        id: result.last_insert_rowid(),
        address: address.to_string(),
        label: label.map(str::to_string),
        created_at: from_unix(to_unix(created_at)),
        last_synced: None,
    })
}

/// Returns false when the address was not tracked. Its transactions go with it
/// through the foreign key cascade.
pub async fn remove_address(pool: &Pool<Sqlite>, address: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM addresses WHERE address = ?")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_address(
    pool: &Pool<Sqlite>,
    address: &str,
) -> Result<Option<TrackedAddress>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, address, label, created_at, last_synced FROM addresses WHERE address = ?",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(address_from_row).transpose()
}

pub async fn list_addresses(pool: &Pool<Sqlite>) -> Result<Vec<TrackedAddress>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, address, label, created_at, last_synced FROM addresses
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(address_from_row).collect()
}

pub async fn update_last_synced(
    pool: &Pool<Sqlite>,
    address: &str,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE addresses SET last_synced = ? WHERE address = ?")
        .bind(to_unix(at))
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn address_from_row(row: &SqliteRow) -> Result<TrackedAddress, sqlx::Error> {
    Ok(TrackedAddress {
        id: row.try_get("id")?,
        address: row.try_get("address")?,
        label: row.try_get("label")?,
        created_at: from_unix(row.try_get("created_at")?),
        last_synced: row
            .try_get::<Option<i64>, _>("last_synced")?
            .map(from_unix),
    })
}
