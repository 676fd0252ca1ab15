//! HTTP handlers

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use super::openapi::ApiDoc;
use super::state::AppState;
use super::types::{ErrorBody, HealthResponse};

/// Submit transfer endpoint
///
/// POST /api/transfer
///
/// The raw body is handed to the validator so that bad JSON surfaces as
/// `MALFORMED_REQUEST` instead of an extractor rejection.
#[utoipa::path(
    post,
    path = "/api/transfer",
    request_body(content = crate::transfer::TransferApiRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Transfer committed", body = super::types::TransferSuccessBody),
        (status = 400, description = "Malformed request or insufficient funds", body = ErrorBody),
        (status = 401, description = "Missing or invalid token, or wrong verification code", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 409, description = "Concurrent update, request a new verification code", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
        (status = 503, description = "Ledger unavailable, safe to retry", body = ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn submit_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    state
        .orchestrator
        .submit(authorization, &body)
        .await
        .into_response()
}

/// Any method other than POST on the transfer route
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("METHOD_NOT_ALLOWED", "Method Not Allowed")),
    )
}

/// Health check endpoint
///
/// - Healthy: 200 OK
/// - Ledger unreachable: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Ledger unavailable", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let executor = state.orchestrator.executor();
    let (status, label) = match executor.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(ledger = executor.ledger().name(), error = %e, "[HEALTH] Ledger check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            ledger: executor.ledger().name().to_string(),
            version: env!("GIT_HASH").to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }),
    )
}

/// OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
