//! Transfer Orchestrator
//!
//! Drives one request through the state machine:
//! Identity Verifier → Transfer Validator → Ledger Transaction Executor.
//! Each terminal state maps to exactly one [`TransferOutcome`]. Nothing is
//! retried here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{FailureClass, TransferError};
use super::executor::LedgerExecutor;
use super::state::TransferState;
use super::types::{TransferId, TransferOutcome};
use super::validator::TransferValidator;
use crate::auth::IdentityVerifier;

/// Tracks the current state of one request and refuses illegal edges
struct Progress {
    transfer_id: TransferId,
    state: TransferState,
}

impl Progress {
    fn new(transfer_id: TransferId) -> Self {
        Self {
            transfer_id,
            state: TransferState::Received,
        }
    }

    fn advance(&mut self, next: TransferState) -> Result<(), TransferError> {
        if !self.state.can_transition_to(next) {
            return Err(TransferError::Internal(format!(
                "invalid state transition {} -> {}",
                self.state, next
            )));
        }
        debug!(transfer_id = %self.transfer_id, from = %self.state, to = %next, "Transfer state");
        self.state = next;
        Ok(())
    }

    /// Terminal failure for the current stage
    fn fail(mut self, error: TransferError) -> TransferOutcome {
        let next = match (self.state, error.class()) {
            (TransferState::Authenticated, FailureClass::Rejected) => TransferState::Rejected,
            _ => TransferState::Failed,
        };
        warn!(
            transfer_id = %self.transfer_id,
            stage = %self.state,
            code = error.code(),
            error = %error,
            "Transfer {}",
            next.as_str().to_lowercase()
        );
        self.state = next;
        TransferOutcome::unsuccessful(self.transfer_id, self.state, error)
    }
}

pub struct TransferOrchestrator {
    verifier: Arc<dyn IdentityVerifier>,
    validator: TransferValidator,
    executor: LedgerExecutor,
}

impl TransferOrchestrator {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        validator: TransferValidator,
        executor: LedgerExecutor,
    ) -> Self {
        Self {
            verifier,
            validator,
            executor,
        }
    }

    pub fn executor(&self) -> &LedgerExecutor {
        &self.executor
    }

    /// Process one "submit transfer" call.
    ///
    /// `authorization` is the raw `Authorization` header, `body` the raw JSON body.
    pub async fn submit(&self, authorization: Option<&str>, body: &[u8]) -> TransferOutcome {
        let mut progress = Progress::new(TransferId::new());

        // RECEIVED → AUTHENTICATED
        let caller = match self.verifier.authenticate(authorization) {
            Ok(caller) => caller,
            Err(e) => return progress.fail(e),
        };
        if let Err(e) = progress.advance(TransferState::Authenticated) {
            return progress.fail(e);
        }

        // AUTHENTICATED → VALIDATED
        let mut req = match self.validator.parse(&caller, body) {
            Ok(req) => req,
            Err(e) => return progress.fail(e),
        };
        req.transfer_id = progress.transfer_id;

        let snapshot = match self.executor.read_account(&req.caller).await {
            Ok(snapshot) => snapshot,
            Err(e) => return progress.fail(e),
        };
        if let Err(e) = self.validator.check(&req, snapshot.as_ref()) {
            return progress.fail(e);
        }
        if let Err(e) = progress.advance(TransferState::Validated) {
            return progress.fail(e);
        }

        // VALIDATED → COMMITTED
        let receipt = match self.executor.commit(&req).await {
            Ok(receipt) => receipt,
            Err(e) => return progress.fail(e),
        };
        if let Err(e) = progress.advance(TransferState::Committed) {
            return progress.fail(e);
        }

        info!(
            transfer_id = %req.transfer_id,
            sender = %req.caller,
            recipient = %req.recipient,
            amount = %req.amount,
            new_balance = %receipt.sender_balance,
            "Transfer committed"
        );
        TransferOutcome::succeeded(&req, &receipt)
    }
}
