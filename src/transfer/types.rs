//! Transfer Core Types
//!
//! Accounts as the ledger stores them, the validated request, the commit
//! command handed to the ledger and the outcome handed back to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::value::RawValue;
use utoipa::ToSchema;

use super::error::TransferError;
use super::state::TransferState;
use crate::money::MinorUnits;

/// Per-request identifier, also the primary key of the ledger journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(uuid::Uuid);

impl TransferId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn inner(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger account identifier. The caller's identity is its own account id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Single-use transfer verification code.
///
/// Never printed: `Debug` is redacted so codes cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn matches(&self, other: &VerificationCode) -> bool {
        let (a, b) = (self.0.as_bytes(), other.0.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode(***)")
    }
}

/// Ledger account snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Never negative after a committed transaction
    pub balance: MinorUnits,
    /// Active code for the one pending transfer, cleared once consumed
    pub verification_code: Option<VerificationCode>,
}

impl Account {
    pub fn new(id: impl Into<String>, balance: MinorUnits, code: Option<&str>) -> Self {
        Self {
            id: AccountId::new(id),
            balance,
            verification_code: code.map(VerificationCode::new),
        }
    }

    /// True when the account holds exactly this active code
    pub fn code_matches(&self, code: &VerificationCode) -> bool {
        self.verification_code
            .as_ref()
            .is_some_and(|active| active.matches(code))
    }
}

// ============================================================================
// Wire body
// ============================================================================

/// `POST /api/transfer` request body.
///
/// Every field is optional at the serde layer so that missing fields surface
/// as `MalformedRequest` from the validator rather than as a framework error.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferApiRequest {
    /// Recipient account id
    #[schema(example = "acct-bob")]
    pub recipient: Option<String>,
    /// Positive amount with at most 2 decimal places, as a number or a string
    #[schema(value_type = Option<String>, example = "40.00")]
    pub amount: Option<Box<RawValue>>,
    /// Single-use verification code issued for this transfer
    #[schema(example = "493021")]
    pub verification_code: Option<String>,
}

// ============================================================================
// Validated request / commit / outcome
// ============================================================================

/// A transfer request that passed the shape check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub transfer_id: TransferId,
    pub caller: AccountId,
    pub recipient: AccountId,
    pub amount: MinorUnits,
    pub verification_code: VerificationCode,
}

/// Atomic balance change handed to the ledger
#[derive(Debug, Clone)]
pub struct TransferCommit {
    pub transfer_id: TransferId,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: MinorUnits,
    /// Code that must still be active on the sender at commit time
    pub expected_code: VerificationCode,
}

impl From<&TransferRequest> for TransferCommit {
    fn from(req: &TransferRequest) -> Self {
        Self {
            transfer_id: req.transfer_id,
            sender: req.caller.clone(),
            recipient: req.recipient.clone(),
            amount: req.amount,
            expected_code: req.verification_code.clone(),
        }
    }
}

/// What the ledger reports after a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub transfer_id: TransferId,
    pub sender_balance: MinorUnits,
    pub recipient_balance: MinorUnits,
    pub committed_at: DateTime<Utc>,
}

/// Ledger journal entry, one per committed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub transfer_id: TransferId,
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: MinorUnits,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Rejected,
    Failed,
}

/// Final result of one request, produced by the orchestrator
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transfer_id: TransferId,
    pub state: TransferState,
    pub status: OutcomeStatus,
    /// Sender balance after the commit, success only
    pub new_balance: Option<MinorUnits>,
    pub recipient: Option<AccountId>,
    pub amount: Option<MinorUnits>,
    pub error: Option<TransferError>,
}

impl TransferOutcome {
    pub fn succeeded(req: &TransferRequest, receipt: &CommitReceipt) -> Self {
        Self {
            transfer_id: req.transfer_id,
            state: TransferState::Committed,
            status: OutcomeStatus::Succeeded,
            new_balance: Some(receipt.sender_balance),
            recipient: Some(req.recipient.clone()),
            amount: Some(req.amount),
            error: None,
        }
    }

    pub fn unsuccessful(transfer_id: TransferId, state: TransferState, error: TransferError) -> Self {
        let status = match state {
            TransferState::Rejected => OutcomeStatus::Rejected,
            _ => OutcomeStatus::Failed,
        };
        Self {
            transfer_id,
            state,
            status,
            new_balance: None,
            recipient: None,
            amount: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    /// Stable reason code (`"OK"` on success)
    pub fn reason_code(&self) -> &'static str {
        self.error.as_ref().map_or("OK", TransferError::code)
    }
}
