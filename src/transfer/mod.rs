//! Transfer Authorization
//!
//! Moves funds between two ledger accounts on behalf of an authenticated
//! caller, gated by a single-use verification code.
//!
//! # State Machine
//!
//! ```text
//! RECEIVED → AUTHENTICATED → VALIDATED → COMMITTED
//!     ↓            ↓             ↓
//!   FAILED    REJECTED/FAILED  FAILED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Check-then-recheck**: validation reads a snapshot for early rejection
//!    only; the ledger repeats the code and funds checks inside the commit
//! 2. **All-or-nothing**: debit, credit, code invalidation and journal entry
//!    commit together
//! 3. **Single use**: a verification code is consumed by exactly one
//!    successful transfer
//! 4. **Bounded**: every ledger call has a timeout

pub mod error;
pub mod executor;
pub mod ledger;
pub mod orchestrator;
pub mod pg_ledger;
pub mod state;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use error::{FailureClass, TransferError};
pub use executor::LedgerExecutor;
pub use ledger::{InMemoryLedger, Ledger};
pub use orchestrator::TransferOrchestrator;
pub use pg_ledger::PgLedger;
pub use state::TransferState;
pub use types::{
    Account, AccountId, CommitReceipt, OutcomeStatus, TransferApiRequest, TransferCommit,
    TransferId, TransferOutcome, TransferRecord, TransferRequest, VerificationCode,
};
pub use validator::TransferValidator;
