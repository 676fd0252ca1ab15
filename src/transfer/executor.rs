//! Ledger Transaction Executor
//!
//! Wraps the [`Ledger`] with the two guarantees the orchestrator relies on:
//!
//! - every ledger call is bounded by a timeout, surfaced as `StorageUnavailable`
//! - a commit runs on its own task, so dropping the request (client
//!   disconnect) cannot interrupt it half way; it completes or aborts as a unit

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::error::TransferError;
use super::ledger::Ledger;
use super::types::{Account, AccountId, CommitReceipt, TransferCommit, TransferRequest};

pub struct LedgerExecutor {
    ledger: Arc<dyn Ledger>,
    timeout: Duration,
}

impl LedgerExecutor {
    pub fn new(ledger: Arc<dyn Ledger>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Snapshot read used for early rejection
    pub async fn read_account(&self, id: &AccountId) -> Result<Option<Account>, TransferError> {
        match tokio::time::timeout(self.timeout, self.ledger.read_account(id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    ledger = self.ledger.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Ledger read timed out"
                );
                Err(TransferError::StorageUnavailable("ledger read timed out".into()))
            }
        }
    }

    /// Debit, credit and invalidate the code in one atomic ledger commit.
    ///
    /// Funds and code are re-checked by the ledger against its latest state.
    pub async fn commit(&self, req: &TransferRequest) -> Result<CommitReceipt, TransferError> {
        let commit = TransferCommit::from(req);
        let ledger = Arc::clone(&self.ledger);
        let timeout = self.timeout;
        let transfer_id = req.transfer_id;

        let task = tokio::spawn(async move {
            tokio::time::timeout(timeout, ledger.commit_transfer(&commit)).await
        });

        match task.await {
            Ok(Ok(Ok(receipt))) => {
                info!(
                    transfer_id = %transfer_id,
                    ledger = self.ledger.name(),
                    "Ledger commit applied"
                );
                Ok(receipt)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => {
                warn!(
                    transfer_id = %transfer_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Ledger commit timed out, aborted"
                );
                Err(TransferError::StorageUnavailable("ledger commit timed out".into()))
            }
            Err(join_err) => {
                error!(transfer_id = %transfer_id, error = %join_err, "Ledger commit task died");
                Err(TransferError::Internal(format!("commit task failed: {}", join_err)))
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), TransferError> {
        match tokio::time::timeout(self.timeout, self.ledger.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::StorageUnavailable("health check timed out".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MinorUnits;
    use crate::transfer::ledger::InMemoryLedger;
    use crate::transfer::types::{TransferId, VerificationCode};
    use async_trait::async_trait;

    /// Delays every call before delegating to an in-memory ledger
    struct SlowLedger {
        inner: InMemoryLedger,
        delay: Duration,
    }

    #[async_trait]
    impl Ledger for SlowLedger {
        fn name(&self) -> &'static str {
            "Slow"
        }

        async fn read_account(&self, id: &AccountId) -> Result<Option<Account>, TransferError> {
            tokio::time::sleep(self.delay).await;
            self.inner.read_account(id).await
        }

        async fn commit_transfer(
            &self,
            commit: &TransferCommit,
        ) -> Result<CommitReceipt, TransferError> {
            tokio::time::sleep(self.delay).await;
            self.inner.commit_transfer(commit).await
        }
    }

    struct PanickingLedger;

    #[async_trait]
    impl Ledger for PanickingLedger {
        fn name(&self) -> &'static str {
            "Panicking"
        }

        async fn read_account(&self, _id: &AccountId) -> Result<Option<Account>, TransferError> {
            Ok(None)
        }

        async fn commit_transfer(
            &self,
            _commit: &TransferCommit,
        ) -> Result<CommitReceipt, TransferError> {
            panic!("storage driver bug");
        }
    }

    fn accounts() -> InMemoryLedger {
        InMemoryLedger::with_accounts([
            Account::new("alice", MinorUnits::new(10_000), Some("c1")),
            Account::new("bob", MinorUnits::ZERO, None),
        ])
    }

    fn request() -> TransferRequest {
        TransferRequest {
            transfer_id: TransferId::new(),
            caller: AccountId::from("alice"),
            recipient: AccountId::from("bob"),
            amount: MinorUnits::new(4_000),
            verification_code: VerificationCode::new("c1"),
        }
    }

    #[tokio::test]
    async fn test_commit_success() {
        let ledger = Arc::new(accounts());
        let executor = LedgerExecutor::new(ledger.clone(), Duration::from_secs(1));
        let receipt = executor.commit(&request()).await.unwrap();
        assert_eq!(receipt.sender_balance, MinorUnits::new(6_000));
        assert_eq!(ledger.total_balance(), MinorUnits::new(10_000));
    }

    #[tokio::test]
    async fn test_read_timeout_is_storage_unavailable() {
        let ledger = Arc::new(SlowLedger {
            inner: accounts(),
            delay: Duration::from_millis(200),
        });
        let executor = LedgerExecutor::new(ledger, Duration::from_millis(20));
        assert!(matches!(
            executor.read_account(&AccountId::from("alice")).await,
            Err(TransferError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_timeout_applies_nothing() {
        let ledger = Arc::new(SlowLedger {
            inner: accounts(),
            delay: Duration::from_millis(200),
        });
        let executor = LedgerExecutor::new(ledger.clone(), Duration::from_millis(20));
        assert!(matches!(
            executor.commit(&request()).await,
            Err(TransferError::StorageUnavailable(_))
        ));

        tokio::time::sleep(Duration::from_millis(300)).await;
        let alice = ledger.inner.snapshot(&AccountId::from("alice")).unwrap();
        assert_eq!(alice.balance, MinorUnits::new(10_000));
        assert!(alice.verification_code.is_some());
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_interrupt_commit() {
        let ledger = Arc::new(SlowLedger {
            inner: accounts(),
            delay: Duration::from_millis(50),
        });
        let executor = LedgerExecutor::new(ledger.clone(), Duration::from_secs(1));

        // Caller gives up long before the ledger finishes
        let req = request();
        let abandoned = tokio::time::timeout(Duration::from_millis(5), executor.commit(&req)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let alice = ledger.inner.snapshot(&AccountId::from("alice")).unwrap();
        assert_eq!(alice.balance, MinorUnits::new(6_000));
        assert!(alice.verification_code.is_none());
        assert_eq!(
            ledger.inner.snapshot(&AccountId::from("bob")).unwrap().balance,
            MinorUnits::new(4_000)
        );
    }

    #[tokio::test]
    async fn test_panicking_commit_is_internal() {
        let executor = LedgerExecutor::new(Arc::new(PanickingLedger), Duration::from_secs(1));
        assert!(matches!(
            executor.commit(&request()).await,
            Err(TransferError::Internal(_))
        ));
    }
}
