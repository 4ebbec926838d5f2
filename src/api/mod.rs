//! HTTP surface of the gateway.
//!
//! - `GET  /health`
//! - `POST /api/process_payment`
//! - `GET  /banker_portal`
//! - `GET  /banker_login` (redirects to the portal)

mod error;
mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::domain::{DeviceSignal, LedgerStore, RiskScorer};
use crate::engine::Engine;

pub use error::ApiError;
pub use types::{AppState, HealthResponse, PaymentResponse};

pub fn create_router<S, L, D>(engine: Arc<Engine<S, L, D>>, high_risk_limit: usize) -> Router
where
    S: RiskScorer + 'static,
    L: LedgerStore + 'static,
    D: DeviceSignal + 'static,
{
    let state = AppState {
        engine,
        high_risk_limit,
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/process_payment",
            post(handlers::process_payment::<S, L, D>),
        )
        .route("/banker_portal", get(handlers::banker_portal::<S, L, D>))
        .route("/banker_login", get(handlers::banker_login))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
