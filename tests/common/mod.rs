#![allow(dead_code)]

use serde_json::{Value, json};
use vmb_gateway::domain::{Error, PaymentPayload, RiskScorer};
use vmb_gateway::features::FeatureVector;

pub const ACCOUNT: &str = "40125566";

/// Always returns the same score.
pub struct FixedScorer(pub f64);

impl RiskScorer for FixedScorer {
    fn score(&self, _features: &FeatureVector) -> Result<f64, Error> {
        Ok(self.0)
    }
}

pub struct FailingScorer;

impl RiskScorer for FailingScorer {
    fn score(&self, _features: &FeatureVector) -> Result<f64, Error> {
        Err(Error::ScoringUnavailable("model not loaded".to_string()))
    }
}

pub fn payment_json(account: &str, amount: Value) -> Value {
    json!({
        "account_number": account,
        "amount": amount,
        "security_pin": "1234",
        "payment_method": "vmb_transfer"
    })
}

pub fn payment(account: &str, amount: Value) -> PaymentPayload {
    serde_json::from_value(payment_json(account, amount)).unwrap()
}
