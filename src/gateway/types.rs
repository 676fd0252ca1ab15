//! HTTP response bodies
//!
//! - Success: `{status: "success", message, newBalance, transferId}`
//! - Failure: `{status: "error", code, message}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::{TransferError, TransferOutcome};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Body of a committed transfer
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferSuccessBody {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Transfer of $40.00 to bob completed.")]
    pub message: String,
    /// Sender balance after the commit, 2 decimal places
    #[schema(example = "60.00")]
    pub new_balance: String,
    #[schema(example = "0b8f5c9e-5d1a-4f5e-9f55-1c3f2f9d6a10")]
    pub transfer_id: String,
}

/// Body of every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "error")]
    pub status: String,
    /// Stable error code
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub code: String,
    #[schema(example = "Insufficient funds for this transfer")]
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&TransferError> for ErrorBody {
    fn from(err: &TransferError) -> Self {
        Self::new(err.code(), err.public_message())
    }
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

impl IntoResponse for TransferOutcome {
    fn into_response(self) -> Response {
        match (self.error, self.new_balance, self.recipient, self.amount) {
            (None, Some(new_balance), Some(recipient), Some(amount)) => {
                let body = TransferSuccessBody {
                    status: STATUS_SUCCESS.to_string(),
                    message: format!("Transfer of ${} to {} completed.", amount, recipient),
                    new_balance: new_balance.to_string(),
                    transfer_id: self.transfer_id.to_string(),
                };
                (StatusCode::OK, Json(body)).into_response()
            }
            (Some(err), ..) => err.into_response(),
            _ => TransferError::Internal("incomplete transfer outcome".into()).into_response(),
        }
    }
}

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Ledger backend in use
    #[schema(example = "Postgres")]
    pub ledger: String,
    /// Build revision
    #[schema(example = "3f2a9c1")]
    pub version: String,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}
