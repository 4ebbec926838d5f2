//! Endpoint handlers

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::error::ApiError;
use super::types::{AppState, HealthResponse, PaymentResponse};
use crate::domain::{DeviceSignal, Error, LedgerStore, PaymentPayload, RiskScorer};
use crate::review;

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The body is parsed by hand so malformed JSON gets the same error shape as
/// a missing field.
pub(super) async fn process_payment<S, L, D>(
    State(state): State<AppState<S, L, D>>,
    body: Bytes,
) -> Result<Response, ApiError>
where
    S: RiskScorer + 'static,
    L: LedgerStore + 'static,
    D: DeviceSignal + 'static,
{
    let payload: PaymentPayload = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidRequest(format!("Malformed JSON body: {}", e)))?;
    debug!(account = ?payload.account_number, "Received payment request");

    let outcome = state.engine.process(payload).await?;

    let status = if outcome.is_completed() {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    Ok((status, Json(PaymentResponse::from(&outcome))).into_response())
}

pub(super) async fn banker_portal<S, L, D>(
    State(state): State<AppState<S, L, D>>,
) -> Result<Response, ApiError>
where
    S: RiskScorer + 'static,
    L: LedgerStore + 'static,
    D: DeviceSignal + 'static,
{
    let snapshot = review::snapshot(state.engine.ledger(), state.high_risk_limit).await?;

    Ok((
        [
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, max-age=0",
            ),
            (header::PRAGMA, "no-cache"),
        ],
        Json(snapshot),
    )
        .into_response())
}

pub(super) async fn banker_login() -> Redirect {
    Redirect::to("/banker_portal")
}
