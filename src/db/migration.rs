use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Create addresses table if not exists
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS addresses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL UNIQUE,
            label TEXT,
            created_at INTEGER NOT NULL,
            last_synced INTEGER
        )",
    )
    .execute(pool)
    .await?;

    // Create transactions table if not exists. (hash, address) is the dedup key.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hash TEXT NOT NULL,
            address TEXT NOT NULL,
            amount INTEGER NOT NULL,
            confirmations INTEGER NOT NULL CHECK (confirmations >= 0),
            block_height INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('sent', 'received')),
            UNIQUE (hash, address),
            FOREIGN KEY (address) REFERENCES addresses(address) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // Add indexes for common queries
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_address
         ON transactions(address)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_timestamp
         ON transactions(timestamp)",
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::connection::establish_in_memory;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = establish_in_memory().await.unwrap();
        super::run_migrations(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('addresses', 'transactions') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["addresses".to_string(), "transactions".to_string()]);
    }
}
