//! Transfer Error Types
//!
//! Every failure a transfer request can end in. All of them are terminal for
//! the request; none is retried inside the service.

use thiserror::Error;

/// Whether a failed request was turned away by validation or broke down
/// while authenticating/committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Rejected,
    Failed,
}

/// Transfer error types
///
/// Error codes are stable and part of the HTTP contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Identity ===
    #[error("Authorization token is required")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidCredential,

    // === Validation ===
    #[error("Invalid data provided: {0}")]
    MalformedRequest(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid transfer verification code")]
    VerificationCodeMismatch,

    #[error("Insufficient funds for this transfer")]
    InsufficientFunds,

    // === Commit ===
    #[error("Transfer conflicted with a concurrent update, request a new verification code and resubmit")]
    Conflict,

    #[error("Ledger storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal system error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Unauthenticated => "UNAUTHENTICATED",
            TransferError::InvalidCredential => "INVALID_CREDENTIAL",
            TransferError::MalformedRequest(_) => "MALFORMED_REQUEST",
            TransferError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            TransferError::VerificationCodeMismatch => "VERIFICATION_CODE_MISMATCH",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::Conflict => "CONFLICT",
            TransferError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Unauthenticated
            | TransferError::InvalidCredential
            | TransferError::VerificationCodeMismatch => 401,
            TransferError::MalformedRequest(_) | TransferError::InsufficientFunds => 400,
            TransferError::AccountNotFound => 404,
            TransferError::Conflict => 409,
            TransferError::StorageUnavailable(_) => 503,
            TransferError::Internal(_) => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Storage and internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            TransferError::StorageUnavailable(_) => {
                "Ledger temporarily unavailable, please retry.".to_string()
            }
            TransferError::Internal(_) => {
                "An internal error occurred during the transfer.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Only storage and internal failures may be retried as-is: the
    /// verification code is consumed on success only.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::StorageUnavailable(_) | TransferError::Internal(_)
        )
    }

    pub fn class(&self) -> FailureClass {
        match self {
            TransferError::MalformedRequest(_)
            | TransferError::AccountNotFound
            | TransferError::VerificationCodeMismatch
            | TransferError::InsufficientFunds => FailureClass::Rejected,
            TransferError::Unauthenticated
            | TransferError::InvalidCredential
            | TransferError::Conflict
            | TransferError::StorageUnavailable(_)
            | TransferError::Internal(_) => FailureClass::Failed,
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        TransferError::MalformedRequest(detail.into())
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::StorageUnavailable(e.to_string())
    }
}

impl From<anyhow::Error> for TransferError {
    fn from(e: anyhow::Error) -> Self {
        TransferError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::Conflict.code(), "CONFLICT");
        assert_eq!(TransferError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(TransferError::Unauthenticated.code(), "UNAUTHENTICATED");
        assert_eq!(
            TransferError::malformed("amount").code(),
            "MALFORMED_REQUEST"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::Unauthenticated.http_status(), 401);
        assert_eq!(TransferError::InvalidCredential.http_status(), 401);
        assert_eq!(TransferError::malformed("x").http_status(), 400);
        assert_eq!(TransferError::InsufficientFunds.http_status(), 400);
        assert_eq!(TransferError::AccountNotFound.http_status(), 404);
        assert_eq!(TransferError::Conflict.http_status(), 409);
        assert_eq!(TransferError::Internal("boom".into()).http_status(), 500);
        assert_eq!(
            TransferError::StorageUnavailable("down".into()).http_status(),
            503
        );
    }

    #[test]
    fn test_retryable() {
        assert!(TransferError::StorageUnavailable("t".into()).is_retryable());
        assert!(TransferError::Internal("t".into()).is_retryable());
        assert!(!TransferError::Conflict.is_retryable());
        assert!(!TransferError::VerificationCodeMismatch.is_retryable());
    }

    #[test]
    fn test_class() {
        assert_eq!(TransferError::InsufficientFunds.class(), FailureClass::Rejected);
        assert_eq!(TransferError::AccountNotFound.class(), FailureClass::Rejected);
        assert_eq!(TransferError::Conflict.class(), FailureClass::Failed);
        assert_eq!(TransferError::InvalidCredential.class(), FailureClass::Failed);
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = TransferError::StorageUnavailable("connection refused 10.0.0.3".into());
        assert!(!err.public_message().contains("10.0.0.3"));
        let err = TransferError::Internal("task panicked".into());
        assert!(!err.public_message().contains("panicked"));
        assert_eq!(
            TransferError::InsufficientFunds.public_message(),
            "Insufficient funds for this transfer"
        );
    }
}
