//! Transfer Request State Machine
//!
//! ```text
//! RECEIVED → AUTHENTICATED → VALIDATED → COMMITTED
//!     ↓            ↓             ↓
//!   FAILED    REJECTED/FAILED  FAILED
//! ```
//!
//! `AUTHENTICATED → FAILED` is taken only when the validation snapshot read
//! cannot reach the ledger.
//!
//! States live only for the lifetime of one request; nothing is persisted.

use std::fmt;

/// Orchestrator states for a single transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Request arrived, nothing checked yet
    Received,

    /// Bearer credential verified, caller known
    Authenticated,

    /// Request passed shape, code and funds checks against a snapshot
    Validated,

    /// Terminal: ledger commit applied
    Committed,

    /// Terminal: validation turned the request away
    Rejected,

    /// Terminal: authentication or commit failed
    Failed,
}

impl TransferState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Committed | TransferState::Rejected | TransferState::Failed
        )
    }

    /// Whether `self → next` is an edge of the state machine
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Received, Authenticated)
                | (Received, Failed)
                | (Authenticated, Validated)
                | (Authenticated, Rejected)
                | (Authenticated, Failed)
                | (Validated, Committed)
                | (Validated, Failed)
        )
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Received => "RECEIVED",
            TransferState::Authenticated => "AUTHENTICATED",
            TransferState::Validated => "VALIDATED",
            TransferState::Committed => "COMMITTED",
            TransferState::Rejected => "REJECTED",
            TransferState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Committed.is_terminal());
        assert!(TransferState::Rejected.is_terminal());
        assert!(TransferState::Failed.is_terminal());

        assert!(!TransferState::Received.is_terminal());
        assert!(!TransferState::Authenticated.is_terminal());
        assert!(!TransferState::Validated.is_terminal());
    }

    #[test]
    fn test_happy_path_edges() {
        assert!(TransferState::Received.can_transition_to(TransferState::Authenticated));
        assert!(TransferState::Authenticated.can_transition_to(TransferState::Validated));
        assert!(TransferState::Validated.can_transition_to(TransferState::Committed));
    }

    #[test]
    fn test_failure_edges_are_stage_specific() {
        assert!(TransferState::Received.can_transition_to(TransferState::Failed));
        assert!(!TransferState::Received.can_transition_to(TransferState::Rejected));

        assert!(TransferState::Authenticated.can_transition_to(TransferState::Rejected));
        assert!(TransferState::Authenticated.can_transition_to(TransferState::Failed));

        assert!(TransferState::Validated.can_transition_to(TransferState::Failed));
        assert!(!TransferState::Validated.can_transition_to(TransferState::Rejected));
    }

    #[test]
    fn test_no_skipping_or_leaving_terminal() {
        assert!(!TransferState::Received.can_transition_to(TransferState::Committed));
        assert!(!TransferState::Authenticated.can_transition_to(TransferState::Committed));
        for terminal in [
            TransferState::Committed,
            TransferState::Rejected,
            TransferState::Failed,
        ] {
            for next in [
                TransferState::Received,
                TransferState::Authenticated,
                TransferState::Validated,
                TransferState::Committed,
                TransferState::Rejected,
                TransferState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::Received.to_string(), "RECEIVED");
        assert_eq!(TransferState::Committed.to_string(), "COMMITTED");
    }
}
