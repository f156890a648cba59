use crate::db::{from_unix, to_unix};
use crate::models::{Direction, LedgerRecord, NewLedgerRecord};
use crate::store::UpsertOutcome;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

/// Insert keyed on (hash, address). On conflict only the confirmation count
/// and block height are refreshed.
pub async fn upsert_transaction(
    pool: &Pool<Sqlite>,
    record: &NewLedgerRecord,
) -> Result<UpsertOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO transactions
        (hash, address, amount, confirmations, block_height, timestamp, type)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(hash, address) DO NOTHING
        "#,
    )
    .bind(&record.hash)
    .bind(&record.address)
    .bind(record.amount)
    .bind(record.confirmations)
    .bind(record.block_height)
    .bind(to_unix(record.timestamp))
    .bind(record.direction.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let outcome = if inserted > 0 {
        UpsertOutcome::Inserted
    } else {
        let updated = sqlx::query(
            r#"
            UPDATE transactions
            SET confirmations = ?, block_height = ?
            WHERE hash = ? AND address = ?
            AND (confirmations != ? OR block_height != ?)
            "#,
        )
        .bind(record.confirmations)
        .bind(record.block_height)
        .bind(&record.hash)
        .bind(&record.address)
        .bind(record.confirmations)
        .bind(record.block_height)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated > 0 {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Unchanged
        }
    };

    tx.commit().await?;

    Ok(outcome)
}

pub async fn transaction_exists(
    pool: &Pool<Sqlite>,
    hash: &str,
    address: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE hash = ? AND address = ?")
            .bind(hash)
            .bind(address)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

pub async fn get_transactions(
    pool: &Pool<Sqlite>,
    address: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<LedgerRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, hash, address, amount, confirmations, block_height, timestamp, type
           FROM transactions
           WHERE address = ?
           ORDER BY timestamp DESC, id DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(address)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn count_transactions(pool: &Pool<Sqlite>, address: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE address = ?")
        .bind(address)
        .fetch_one(pool)
        .await
}

/// Sum of amounts over confirmed (confirmations >= 1) or unconfirmed
/// (confirmations = 0) records.
pub async fn sum_amounts(
    pool: &Pool<Sqlite>,
    address: &str,
    confirmed: bool,
) -> Result<i64, sqlx::Error> {
    let query = if confirmed {
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE address = ? AND confirmations >= 1"
    } else {
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE address = ? AND confirmations = 0"
    };

    sqlx::query_scalar(query).bind(address).fetch_one(pool).await
}

fn record_from_row(row: &SqliteRow) -> Result<LedgerRecord, sqlx::Error> {
    let kind: String = row.try_get("type")?;
    let direction = Direction::parse(&kind)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown transaction type: {}", kind).into()))?;

    Ok(LedgerRecord {
        id: row.try_get("id")?,
        hash: row.try_get("hash")?,
        address: row.try_get("address")?,
        amount: row.try_get("amount")?,
        confirmations: row.try_get("confirmations")?,
        block_height: row.try_get("block_height")?,
        timestamp: from_unix(row.try_get("timestamp")?),
        direction,
    })
}
