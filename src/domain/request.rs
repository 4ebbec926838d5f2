use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Error, PaymentMethod};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required transaction data.";

/// Wire shape of `POST /api/process_payment`. Every field is optional here so
/// that presence is checked explicitly when converting into a `PaymentRequest`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaymentPayload {
    pub account_number: Option<String>,
    pub amount: Option<Value>,
    pub security_pin: Option<String>,
    pub payment_method: Option<String>,
}

/// A payment request whose fields are present and well typed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub account_number: String,
    pub amount: Decimal,
    pub security_pin: String,
    pub payment_method: PaymentMethod,
}

impl TryFrom<PaymentPayload> for PaymentRequest {
    type Error = Error;

    fn try_from(payload: PaymentPayload) -> Result<Self, Self::Error> {
        let (Some(account_number), Some(amount), Some(security_pin), Some(payment_method)) = (
            payload.account_number,
            payload.amount,
            payload.security_pin,
            payload.payment_method,
        ) else {
            return Err(Error::InvalidRequest(MISSING_FIELDS_MESSAGE.to_string()));
        };

        Ok(PaymentRequest {
            account_number: account_number.trim().to_string(),
            amount: parse_amount(&amount)?,
            security_pin,
            payment_method: PaymentMethod::parse(&payment_method),
        })
    }
}

/// Accepts JSON numbers and numeric strings; the result must be positive.
fn parse_amount(value: &Value) -> Result<Decimal, Error> {
    let parsed = match value {
        Value::Number(n) => decimal_from_str(&n.to_string()),
        Value::String(s) => decimal_from_str(s.trim()),
        _ => None,
    };

    let amount = parsed
        .ok_or_else(|| Error::InvalidRequest(format!("Amount must be numeric, got {}", value)))?;

    if amount <= Decimal::ZERO {
        return Err(Error::InvalidRequest(format!(
            "Amount must be greater than zero, got {}",
            amount
        )));
    }

    Ok(amount)
}

fn decimal_from_str(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
