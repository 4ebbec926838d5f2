use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, PaymentRequest};

/// Scores above this are labelled as probable fraud for later retraining.
pub const FRAUD_LABEL_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    VmbTransfer,
    CardPayment,
    Crypto,
    DigitalWallet,
    Unknown,
}

impl PaymentMethod {
    /// Unrecognised methods are accepted and classified as `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vmb_transfer" => Self::VmbTransfer,
            "card_payment" => Self::CardPayment,
            "crypto" => Self::Crypto,
            "digital_wallet" => Self::DigitalWallet,
            _ => Self::Unknown,
        }
    }

    /// Categorical id fed to the classifier.
    pub fn id(self) -> u8 {
        match self {
            Self::VmbTransfer => 1,
            Self::CardPayment => 2,
            Self::Crypto => 3,
            Self::DigitalWallet => 4,
            Self::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VmbTransfer => "vmb_transfer",
            Self::CardPayment => "card_payment",
            Self::Crypto => "crypto",
            Self::DigitalWallet => "digital_wallet",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Approved,
    Flagged,
    Denied,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Flagged => "Flagged",
            Self::Denied => "Denied",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(Self::Approved),
            "Flagged" => Ok(Self::Flagged),
            "Denied" => Ok(Self::Denied),
            other => Err(Error::Ledger(format!("Unknown transaction status: {}", other))),
        }
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One journal entry. Written once per processed payment and never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_number: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub risk_score: f64,
    pub is_fraud_label: bool,
}

impl TransactionRecord {
    pub fn new(request: &PaymentRequest, status: TransactionStatus, risk_score: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number: request.account_number.clone(),
            amount: request.amount,
            payment_method: request.payment_method,
            timestamp: Utc::now(),
            status,
            risk_score,
            is_fraud_label: risk_score > FRAUD_LABEL_THRESHOLD,
        }
    }
}

impl core::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{},account={},tx={},amount={},method={},risk={:.4}",
            self.status,
            self.account_number,
            self.id,
            self.amount,
            self.payment_method.as_str(),
            self.risk_score
        )
    }
}
