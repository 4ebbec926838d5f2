//! Feature extraction for fraud-risk scoring.
//!
//! Turns a validated payment request into the fixed-length vector the
//! classifier was trained on. Feature order matters and is recorded in the
//! model artifact so a mismatched model is rejected at load time.

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::{DeviceSignal, Error, PaymentRequest};

/// Feature names in the exact order the model expects them.
pub const FEATURE_NAMES: [&str; 4] = ["account_prefix", "amount", "method_id", "device_risk"];

/// Number of leading account-number characters used as the prefix feature.
pub const ACCOUNT_PREFIX_LEN: usize = 4;

pub const DEVICE_RISK_MIN: f64 = 0.1;
pub const DEVICE_RISK_MAX: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; 4]);

impl FeatureVector {
    pub fn new(account_prefix: f64, amount: f64, method_id: f64, device_risk: f64) -> Self {
        Self([account_prefix, amount, method_id, device_risk])
    }

    pub fn values(&self) -> &[f64; 4] {
        &self.0
    }

    pub fn account_prefix(&self) -> f64 {
        self.0[0]
    }

    pub fn amount(&self) -> f64 {
        self.0[1]
    }

    pub fn method_id(&self) -> f64 {
        self.0[2]
    }

    pub fn device_risk(&self) -> f64 {
        self.0[3]
    }
}

/// Simulated device risk drawn uniformly from `[0.1, 0.9]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformDeviceSignal;

impl DeviceSignal for UniformDeviceSignal {
    fn device_risk(&self) -> f64 {
        rand::thread_rng().gen_range(DEVICE_RISK_MIN..=DEVICE_RISK_MAX)
    }
}

/// Constant device risk, for replaying or testing a pipeline deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDeviceSignal(pub f64);

impl DeviceSignal for FixedDeviceSignal {
    fn device_risk(&self) -> f64 {
        self.0
    }
}

pub struct FeatureExtractor<D: DeviceSignal> {
    signal: D,
}

impl<D: DeviceSignal> FeatureExtractor<D> {
    pub fn new(signal: D) -> Self {
        Self { signal }
    }

    /// Extract `[account_prefix, amount, method_id, device_risk]`.
    pub fn extract(&self, request: &PaymentRequest) -> Result<FeatureVector, Error> {
        let account_prefix = account_prefix(&request.account_number)?;
        let amount = request
            .amount
            .to_f64()
            .filter(|a| a.is_finite())
            .ok_or_else(|| {
                Error::InvalidRequest(format!("Amount {} is out of range", request.amount))
            })?;

        Ok(FeatureVector::new(
            account_prefix,
            amount,
            f64::from(request.payment_method.id()),
            self.signal.device_risk(),
        ))
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }
}

fn account_prefix(account_number: &str) -> Result<f64, Error> {
    let prefix: String = account_number.chars().take(ACCOUNT_PREFIX_LEN).collect();

    if prefix.chars().count() < ACCOUNT_PREFIX_LEN {
        return Err(Error::InvalidRequest(format!(
            "Account number must have at least {} characters",
            ACCOUNT_PREFIX_LEN
        )));
    }

    prefix
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| {
            Error::InvalidRequest(format!("Account prefix {:?} is not numeric", prefix))
        })
}
