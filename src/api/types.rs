use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{DeviceSignal, LedgerStore, RiskScorer};
use crate::engine::{Engine, PaymentOutcome};

/// Shared handler state.
pub struct AppState<S, L, D>
where
    S: RiskScorer,
    L: LedgerStore,
    D: DeviceSignal,
{
    pub engine: Arc<Engine<S, L, D>>,
    /// Size of the banker portal's highest-risk list.
    pub high_risk_limit: usize,
}

impl<S, L, D> Clone for AppState<S, L, D>
where
    S: RiskScorer,
    L: LedgerStore,
    D: DeviceSignal,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            high_risk_limit: self.high_risk_limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of both completed (200) and denied (403) payments.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub status: String,
    pub transaction_id: Uuid,
    pub risk_score: f64,
    pub message: String,
}

impl From<&PaymentOutcome> for PaymentResponse {
    fn from(outcome: &PaymentOutcome) -> Self {
        let status = if outcome.is_completed() {
            outcome.status.as_str().to_string()
        } else {
            "denied".to_string()
        };

        Self {
            status,
            transaction_id: outcome.transaction_id,
            risk_score: outcome.risk_score,
            message: outcome.message(),
        }
    }
}
