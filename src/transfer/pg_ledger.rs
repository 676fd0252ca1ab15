//! PostgreSQL Ledger
//!
//! Accounts live in `accounts_tb`, committed transfers in `transfers_tb`.
//! A commit is one transaction that locks both account rows with
//! `SELECT ... FOR UPDATE` (in account id order, so opposite-direction
//! transfers cannot deadlock), re-checks, writes and commits. Dropping the
//! transaction before `commit()` rolls everything back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, warn};

use super::error::TransferError;
use super::ledger::{Ledger, recheck_commit};
use super::types::{Account, AccountId, CommitReceipt, TransferCommit, VerificationCode};
use crate::money::MinorUnits;

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace an account (seeding and tests)
    pub async fn upsert_account(&self, account: &Account) -> Result<(), TransferError> {
        sqlx::query(
            r#"
            INSERT INTO accounts_tb (account_id, balance, verification_code, version, updated_at)
            VALUES ($1, $2, $3, 0, NOW())
            ON CONFLICT (account_id)
            DO UPDATE SET balance = EXCLUDED.balance,
                          verification_code = EXCLUDED.verification_code,
                          version = accounts_tb.version + 1,
                          updated_at = NOW()
            "#,
        )
        .bind(account.id.as_str())
        .bind(account.balance.raw())
        .bind(account.verification_code.as_ref().map(VerificationCode::as_str))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, TransferError> {
    let id: String = row.try_get("account_id")?;
    let balance: i64 = row.try_get("balance")?;
    let code: Option<String> = row.try_get("verification_code")?;
    Ok(Account {
        id: AccountId::new(id),
        balance: MinorUnits::new(balance),
        verification_code: code.map(VerificationCode::new),
    })
}

#[async_trait]
impl Ledger for PgLedger {
    fn name(&self) -> &'static str {
        "Postgres"
    }

    async fn read_account(&self, id: &AccountId) -> Result<Option<Account>, TransferError> {
        let row = sqlx::query(
            "SELECT account_id, balance, verification_code FROM accounts_tb WHERE account_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn commit_transfer(&self, commit: &TransferCommit) -> Result<CommitReceipt, TransferError> {
        let mut tx = self.pool.begin().await?;

        let ids = vec![
            commit.sender.as_str().to_string(),
            commit.recipient.as_str().to_string(),
        ];
        let rows = sqlx::query(
            r#"
            SELECT account_id, balance, verification_code FROM accounts_tb
            WHERE account_id = ANY($1)
            ORDER BY account_id
            FOR UPDATE
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&mut *tx)
        .await?;

        let accounts = rows
            .iter()
            .map(row_to_account)
            .collect::<Result<Vec<_>, _>>()?;
        let sender = accounts.iter().find(|a| a.id == commit.sender);
        let recipient = accounts.iter().find(|a| a.id == commit.recipient);

        let (sender_balance, recipient_balance) =
            match recheck_commit(commit, sender, recipient) {
                Ok(balances) => balances,
                Err(e) => {
                    debug!(transfer_id = %commit.transfer_id, error = %e, "Commit re-check failed");
                    tx.rollback().await?;
                    return Err(e);
                }
            };

        // Guarded on code and balance in addition to the row lock
        let debited = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance - $1, verification_code = NULL,
                version = version + 1, updated_at = NOW()
            WHERE account_id = $2 AND verification_code = $3 AND balance >= $1
            "#,
        )
        .bind(commit.amount.raw())
        .bind(commit.sender.as_str())
        .bind(commit.expected_code.as_str())
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() != 1 {
            warn!(transfer_id = %commit.transfer_id, "Sender row changed under lock");
            tx.rollback().await?;
            return Err(TransferError::Conflict);
        }

        sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance + $1, version = version + 1, updated_at = NOW()
            WHERE account_id = $2
            "#,
        )
        .bind(commit.amount.raw())
        .bind(commit.recipient.as_str())
        .execute(&mut *tx)
        .await?;

        let committed_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO transfers_tb (transfer_id, sender_id, recipient_id, amount, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING created_at
            "#,
        )
        .bind(commit.transfer_id.inner())
        .bind(commit.sender.as_str())
        .bind(commit.recipient.as_str())
        .bind(commit.amount.raw())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CommitReceipt {
            transfer_id: commit.transfer_id,
            sender_balance,
            recipient_balance,
            committed_at,
        })
    }

    async fn health_check(&self) -> Result<(), TransferError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
