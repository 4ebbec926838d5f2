use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub account_number: String,
    pub customer_name: String,
    pub current_balance: Decimal, // serialized as a string to keep the scale
}

impl Account {
    pub fn new(
        account_number: impl Into<String>,
        customer_name: impl Into<String>,
        current_balance: Decimal,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            customer_name: customer_name.into(),
            current_balance,
        }
    }

    pub fn covers(&self, amount: Decimal) -> bool {
        self.current_balance >= amount
    }
}
