//! Database connection management

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts_tb (
    account_id        TEXT PRIMARY KEY,
    balance           BIGINT NOT NULL CHECK (balance >= 0),
    verification_code TEXT NULL,
    version           BIGINT NOT NULL DEFAULT 0,
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers_tb (
    transfer_id  UUID PRIMARY KEY,
    sender_id    TEXT NOT NULL REFERENCES accounts_tb (account_id),
    recipient_id TEXT NOT NULL REFERENCES accounts_tb (account_id),
    amount       BIGINT NOT NULL CHECK (amount > 0),
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSFERS_SENDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transfers_sender ON transfers_tb (sender_id, created_at)";

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create ledger tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for (name, ddl) in [
            ("accounts_tb", CREATE_ACCOUNTS_TABLE),
            ("transfers_tb", CREATE_TRANSFERS_TABLE),
            ("idx_transfers_sender", CREATE_TRANSFERS_SENDER_INDEX),
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create {}", name))?;
        }
        tracing::info!("Ledger schema ready");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
