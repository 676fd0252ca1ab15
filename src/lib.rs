//! Ledger Transfer - authenticated account-to-account transfers
//!
//! # Modules
//!
//! - [`money`] - Exact 2-decimal amount type
//! - [`auth`] - Bearer token identity verification
//! - [`transfer`] - Validator, ledger, executor and orchestrator
//! - [`db`] - PostgreSQL pool and schema
//! - [`gateway`] - axum HTTP surface
//! - [`config`] / [`logging`] - Start-up plumbing

pub mod config;
pub mod logging;
pub mod money;

pub mod auth;
pub mod db;
pub mod gateway;
pub mod transfer;

// Convenient re-exports at crate root
pub use auth::{IdentityVerifier, JwtVerifier};
pub use money::MinorUnits;
pub use transfer::{
    InMemoryLedger, Ledger, LedgerExecutor, PgLedger, TransferError, TransferOrchestrator,
    TransferOutcome, TransferValidator,
};
