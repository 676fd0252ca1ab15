//! Ledger collaborator
//!
//! The only write path to account balances. `commit_transfer` is atomic:
//! debit, credit, code invalidation and the journal entry all land together
//! or not at all, and the funds/code checks are repeated against the latest
//! state inside that same atomic step.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use super::error::TransferError;
use super::types::{Account, AccountId, CommitReceipt, TransferCommit, TransferRecord};
use crate::money::MinorUnits;

/// Account storage as seen by the transfer core
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Read the current state of one account
    async fn read_account(&self, id: &AccountId) -> Result<Option<Account>, TransferError>;

    /// Apply a transfer atomically.
    ///
    /// # Errors
    /// - `Conflict`: sender gone, code no longer active, or funds now short
    /// - `AccountNotFound`: recipient does not exist
    /// - `StorageUnavailable`: backend failure
    async fn commit_transfer(&self, commit: &TransferCommit) -> Result<CommitReceipt, TransferError>;

    /// Cheap liveness probe
    async fn health_check(&self) -> Result<(), TransferError> {
        Ok(())
    }
}

/// Checks shared by every backend, run against the freshly locked rows.
///
/// Returns `(new_sender_balance, new_recipient_balance)`.
pub(crate) fn recheck_commit(
    commit: &TransferCommit,
    sender: Option<&Account>,
    recipient: Option<&Account>,
) -> Result<(MinorUnits, MinorUnits), TransferError> {
    if commit.sender == commit.recipient {
        return Err(TransferError::malformed("cannot transfer to the same account"));
    }
    if !commit.amount.is_positive() {
        return Err(TransferError::malformed("amount must be positive"));
    }

    let sender = sender.ok_or(TransferError::Conflict)?;
    if !sender.code_matches(&commit.expected_code) {
        return Err(TransferError::Conflict);
    }
    if sender.balance < commit.amount {
        return Err(TransferError::Conflict);
    }
    let recipient = recipient.ok_or(TransferError::AccountNotFound)?;

    let sender_balance = sender
        .balance
        .checked_sub(commit.amount)
        .ok_or(TransferError::Conflict)?;
    let recipient_balance = recipient
        .balance
        .checked_add(commit.amount)
        .ok_or_else(|| TransferError::Internal("recipient balance overflow".into()))?;

    Ok((sender_balance, recipient_balance))
}

// ============================================================================
// In-memory ledger
// ============================================================================

#[derive(Default)]
struct LedgerInner {
    accounts: HashMap<AccountId, Account>,
    journal: Vec<TransferRecord>,
}

/// Process-local ledger.
///
/// A commit holds one mutex for its whole read-check-write sequence and never
/// awaits while holding it.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<LedgerInner>,
    unavailable: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let ledger = Self::new();
        for account in accounts {
            ledger.upsert_account(account);
        }
        ledger
    }

    /// Insert or replace an account
    pub fn upsert_account(&self, account: Account) {
        let mut inner = self.lock();
        inner.accounts.insert(account.id.clone(), account);
    }

    /// Simulate a storage outage: every call fails with `StorageUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> MinorUnits {
        let inner = self.lock();
        MinorUnits::new(inner.accounts.values().map(|a| a.balance.raw()).sum())
    }

    pub fn journal(&self) -> Vec<TransferRecord> {
        self.lock().journal.clone()
    }

    pub fn snapshot(&self, id: &AccountId) -> Option<Account> {
        self.lock().accounts.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        // Writes only follow a full recheck, so a poisoned guard still holds consistent state
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_available(&self) -> Result<(), TransferError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransferError::StorageUnavailable(
                "in-memory ledger marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    async fn read_account(&self, id: &AccountId) -> Result<Option<Account>, TransferError> {
        self.ensure_available()?;
        Ok(self.lock().accounts.get(id).cloned())
    }

    async fn commit_transfer(&self, commit: &TransferCommit) -> Result<CommitReceipt, TransferError> {
        self.ensure_available()?;
        let mut inner = self.lock();

        let (sender_balance, recipient_balance) = recheck_commit(
            commit,
            inner.accounts.get(&commit.sender),
            inner.accounts.get(&commit.recipient),
        )?;

        // All checks passed: apply every effect under the same guard
        if let Some(sender) = inner.accounts.get_mut(&commit.sender) {
            sender.balance = sender_balance;
            sender.verification_code = None;
        }
        if let Some(recipient) = inner.accounts.get_mut(&commit.recipient) {
            recipient.balance = recipient_balance;
        }
        let committed_at = Utc::now();
        inner.journal.push(TransferRecord {
            transfer_id: commit.transfer_id,
            sender: commit.sender.clone(),
            recipient: commit.recipient.clone(),
            amount: commit.amount,
            created_at: committed_at,
        });

        Ok(CommitReceipt {
            transfer_id: commit.transfer_id,
            sender_balance,
            recipient_balance,
            committed_at,
        })
    }

    async fn health_check(&self) -> Result<(), TransferError> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::types::{TransferId, VerificationCode};

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_accounts([
            Account::new("alice", MinorUnits::new(10_000), Some("c1")),
            Account::new("bob", MinorUnits::new(500), None),
        ])
    }

    fn commit(amount: i64, code: &str) -> TransferCommit {
        TransferCommit {
            transfer_id: TransferId::new(),
            sender: AccountId::from("alice"),
            recipient: AccountId::from("bob"),
            amount: MinorUnits::new(amount),
            expected_code: VerificationCode::new(code),
        }
    }

    #[tokio::test]
    async fn test_commit_moves_funds_and_clears_code() {
        let ledger = ledger();
        let receipt = ledger.commit_transfer(&commit(4_000, "c1")).await.unwrap();
        assert_eq!(receipt.sender_balance, MinorUnits::new(6_000));
        assert_eq!(receipt.recipient_balance, MinorUnits::new(4_500));

        let alice = ledger.snapshot(&AccountId::from("alice")).unwrap();
        assert_eq!(alice.balance, MinorUnits::new(6_000));
        assert!(alice.verification_code.is_none());
        assert_eq!(
            ledger.snapshot(&AccountId::from("bob")).unwrap().balance,
            MinorUnits::new(4_500)
        );
        assert_eq!(ledger.total_balance(), MinorUnits::new(10_500));
        assert_eq!(ledger.journal().len(), 1);
    }

    #[tokio::test]
    async fn test_second_commit_with_same_code_conflicts() {
        let ledger = ledger();
        ledger.commit_transfer(&commit(100, "c1")).await.unwrap();
        assert_eq!(
            ledger.commit_transfer(&commit(100, "c1")).await,
            Err(TransferError::Conflict)
        );
        assert_eq!(ledger.journal().len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_funds_at_commit_conflicts_without_effects() {
        let ledger = ledger();
        assert_eq!(
            ledger.commit_transfer(&commit(10_001, "c1")).await,
            Err(TransferError::Conflict)
        );
        let alice = ledger.snapshot(&AccountId::from("alice")).unwrap();
        assert_eq!(alice.balance, MinorUnits::new(10_000));
        assert!(alice.verification_code.is_some());
    }

    #[tokio::test]
    async fn test_missing_recipient_applies_nothing() {
        let ledger = ledger();
        let mut c = commit(100, "c1");
        c.recipient = AccountId::from("carol");
        assert_eq!(
            ledger.commit_transfer(&c).await,
            Err(TransferError::AccountNotFound)
        );
        let alice = ledger.snapshot(&AccountId::from("alice")).unwrap();
        assert_eq!(alice.balance, MinorUnits::new(10_000));
        assert!(alice.verification_code.is_some());
        assert!(ledger.journal().is_empty());
    }

    #[tokio::test]
    async fn test_missing_sender_conflicts() {
        let ledger = ledger();
        let mut c = commit(100, "c1");
        c.sender = AccountId::from("ghost");
        assert_eq!(ledger.commit_transfer(&c).await, Err(TransferError::Conflict));
    }

    #[tokio::test]
    async fn test_self_transfer_refused() {
        let ledger = ledger();
        let mut c = commit(100, "c1");
        c.recipient = AccountId::from("alice");
        assert!(matches!(
            ledger.commit_transfer(&c).await,
            Err(TransferError::MalformedRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_recipient_overflow_is_internal() {
        let ledger = ledger();
        ledger.upsert_account(Account::new("bob", MinorUnits::new(i64::MAX), None));
        assert!(matches!(
            ledger.commit_transfer(&commit(1, "c1")).await,
            Err(TransferError::Internal(_))
        ));
        assert_eq!(
            ledger.snapshot(&AccountId::from("alice")).unwrap().balance,
            MinorUnits::new(10_000)
        );
    }

    #[tokio::test]
    async fn test_unavailable() {
        let ledger = ledger();
        ledger.set_unavailable(true);
        assert!(matches!(
            ledger.read_account(&AccountId::from("alice")).await,
            Err(TransferError::StorageUnavailable(_))
        ));
        assert!(ledger.health_check().await.is_err());
        ledger.set_unavailable(false);
        assert!(ledger.health_check().await.is_ok());
    }
}
