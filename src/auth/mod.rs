//! Identity Verifier
//!
//! Turns the `Authorization` header into a caller identity. Never touches the
//! ledger.
//!
//! - Missing header, wrong scheme, empty token → `Unauthenticated`
//! - Bad signature, expired, unusable subject → `InvalidCredential`

pub mod jwt;

pub use jwt::{Claims, JwtVerifier};

use crate::transfer::error::TransferError;
use crate::transfer::types::AccountId;

const BEARER_PREFIX: &str = "Bearer ";

/// Verifies a bearer credential and yields the caller's account id
pub trait IdentityVerifier: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<AccountId, TransferError>;

    /// Full check of a raw `Authorization` header value
    fn authenticate(&self, authorization: Option<&str>) -> Result<AccountId, TransferError> {
        let token = extract_bearer(authorization)?;
        self.verify_token(token)
    }
}

/// Pull the token out of `Bearer <token>`
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, TransferError> {
    let header = authorization.ok_or(TransferError::Unauthenticated)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TransferError::Unauthenticated)?
        .trim();
    if token.is_empty() {
        return Err(TransferError::Unauthenticated);
    }
    Ok(token)
}
