//! Three-tier decision policy over the model's risk score.

use crate::domain::TransactionStatus;

/// Scores at or above this are denied outright.
pub const DENY_THRESHOLD: f64 = 0.8;
/// Scores at or above this (and below `DENY_THRESHOLD`) are held for review.
pub const FLAG_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenialReason {
    HighFraudRisk { risk_score: f64 },
    InsufficientFunds,
    UnknownAccount,
}

impl core::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenialReason::HighFraudRisk { risk_score } => {
                write!(f, "High Fraud Risk Detected (Score: {:.2})", risk_score)
            }
            DenialReason::InsufficientFunds => f.write_str("Insufficient Funds."),
            DenialReason::UnknownAccount => f.write_str("Invalid VMB Account Number."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Provisional until the fund check passes.
    Approved,
    /// Held for manual review; no funds move.
    Flagged,
    Denied(DenialReason),
}

impl Decision {
    pub fn status(&self) -> TransactionStatus {
        match self {
            Decision::Approved => TransactionStatus::Approved,
            Decision::Flagged => TransactionStatus::Flagged,
            Decision::Denied(_) => TransactionStatus::Denied,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Denied(_))
    }

    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Decision::Denied(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// A NaN score is treated as maximal risk.
pub fn decide(risk_score: f64) -> Decision {
    if risk_score.is_nan() || risk_score >= DENY_THRESHOLD {
        Decision::Denied(DenialReason::HighFraudRisk { risk_score })
    } else if risk_score >= FLAG_THRESHOLD {
        Decision::Flagged
    } else {
        Decision::Approved
    }
}
