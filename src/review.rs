//! Read-only views for banker review.

use serde::Serialize;

use crate::domain::{Account, Error, LedgerStore, TransactionRecord, TransactionStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSnapshot {
    /// Every flagged transaction, highest risk first.
    pub flagged: Vec<TransactionRecord>,
    /// Highest-risk transactions of any status.
    pub high_risk: Vec<TransactionRecord>,
    pub accounts: Vec<Account>,
}

pub async fn snapshot<L: LedgerStore>(ledger: &L, limit: usize) -> Result<ReviewSnapshot, Error> {
    Ok(ReviewSnapshot {
        flagged: ledger
            .transactions_with_status(TransactionStatus::Flagged)
            .await?,
        high_risk: ledger.highest_risk_transactions(limit).await?,
        accounts: ledger.accounts().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LedgerUnit, PaymentMethod, PaymentRequest};
    use crate::ledger::InMemoryLedger;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn snapshot_lists_flagged_and_top_risk() {
        let ledger = InMemoryLedger::with_accounts([
            Account::new("20002222", "Linus", dec!(10)),
            Account::new("10001111", "Ada", dec!(20)),
        ]);
        let request = PaymentRequest {
            account_number: "10001111".to_string(),
            amount: dec!(5),
            security_pin: "1234".to_string(),
            payment_method: PaymentMethod::CardPayment,
        };

        let mut unit = ledger.begin().await.unwrap();
        for (status, risk) in [
            (TransactionStatus::Approved, 0.1),
            (TransactionStatus::Flagged, 0.5),
            (TransactionStatus::Denied, 0.99),
            (TransactionStatus::Flagged, 0.7),
        ] {
            unit.append_transaction(&TransactionRecord::new(&request, status, risk))
                .await
                .unwrap();
        }
        unit.commit().await.unwrap();

        let view = snapshot(&ledger, 3).await.unwrap();

        let flagged: Vec<f64> = view.flagged.iter().map(|r| r.risk_score).collect();
        assert_eq!(flagged, vec![0.7, 0.5]);
        let top: Vec<f64> = view.high_risk.iter().map(|r| r.risk_score).collect();
        assert_eq!(top, vec![0.99, 0.7, 0.5]);
        let numbers: Vec<&str> = view
            .accounts
            .iter()
            .map(|a| a.account_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["10001111", "20002222"]);
    }

    #[tokio::test]
    async fn empty_ledger_gives_empty_snapshot() {
        let view = snapshot(&InMemoryLedger::new(), 10).await.unwrap();
        assert!(view.flagged.is_empty());
        assert!(view.high_risk.is_empty());
        assert!(view.accounts.is_empty());
    }
}
