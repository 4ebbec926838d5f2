use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{
    Account, Error, LedgerStore, LedgerUnit, TransactionRecord, TransactionStatus,
};

#[derive(Default, Debug)]
struct Book {
    accounts: HashMap<String, Account>,
    journal: Vec<TransactionRecord>,
}

/// Process-local ledger. Units hold the book lock for their whole lifetime.
#[derive(Default, Debug, Clone)]
pub struct InMemoryLedger {
    book: Arc<Mutex<Book>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.account_number.clone(), a))
            .collect();

        Self {
            book: Arc::new(Mutex::new(Book {
                accounts,
                journal: Vec::new(),
            })),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, Error> {
        Ok(MemoryUnit {
            book: self.book.clone().lock_owned().await,
            staged_accounts: HashMap::new(),
            staged_journal: Vec::new(),
        })
    }

    async fn account(&self, account_number: &str) -> Result<Account, Error> {
        self.book
            .lock()
            .await
            .accounts
            .get(account_number)
            .cloned()
            .ok_or_else(|| Error::AccountNotFound(account_number.to_string()))
    }

    async fn accounts(&self) -> Result<Vec<Account>, Error> {
        let mut accounts: Vec<Account> =
            self.book.lock().await.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(accounts)
    }

    async fn transactions_with_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let mut records: Vec<TransactionRecord> = self
            .book
            .lock()
            .await
            .journal
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        Ok(records)
    }

    async fn highest_risk_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let mut records = self.book.lock().await.journal.clone();
        records.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        records.truncate(limit);
        Ok(records)
    }

    async fn journal_for(&self, account_number: &str) -> Result<Vec<TransactionRecord>, Error> {
        Ok(self
            .book
            .lock()
            .await
            .journal
            .iter()
            .filter(|r| r.account_number == account_number)
            .cloned()
            .collect())
    }
}

/// Changes are staged and only applied to the book on commit.
#[derive(Debug)]
pub struct MemoryUnit {
    book: OwnedMutexGuard<Book>,
    staged_accounts: HashMap<String, Account>,
    staged_journal: Vec<TransactionRecord>,
}

impl MemoryUnit {
    fn staged_account(&mut self, account_number: &str) -> Result<&mut Account, Error> {
        match self.staged_accounts.entry(account_number.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let account = self
                    .book
                    .accounts
                    .get(account_number)
                    .cloned()
                    .ok_or_else(|| Error::AccountNotFound(account_number.to_string()))?;
                Ok(e.insert(account))
            }
        }
    }
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn get_balance(&mut self, account_number: &str) -> Result<Decimal, Error> {
        Ok(self.staged_account(account_number)?.current_balance)
    }

    async fn open_account(&mut self, account: &Account) -> Result<(), Error> {
        if self.book.accounts.contains_key(&account.account_number) {
            return Err(Error::AccountExists(account.account_number.clone()));
        }

        match self.staged_accounts.entry(account.account_number.clone()) {
            Entry::Vacant(e) => {
                e.insert(account.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(Error::AccountExists(account.account_number.clone())),
        }
    }

    async fn debit(&mut self, account_number: &str, amount: Decimal) -> Result<Decimal, Error> {
        let account = self.staged_account(account_number)?;

        if !account.covers(amount) {
            return Err(Error::InsufficientFunds(account_number.to_string()));
        }

        account.current_balance -= amount;
        Ok(account.current_balance)
    }

    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<(), Error> {
        let duplicate = self
            .book
            .journal
            .iter()
            .chain(&self.staged_journal)
            .any(|r| r.id == record.id);

        if duplicate {
            return Err(Error::Ledger(format!(
                "Transaction ID {} already exists",
                record.id
            )));
        }

        self.staged_journal.push(record.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), Error> {
        let MemoryUnit {
            mut book,
            staged_accounts,
            staged_journal,
        } = self;

        book.accounts.extend(staged_accounts);
        book.journal.extend(staged_journal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentMethod, PaymentRequest};
    use rust_decimal_macros::dec;

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_accounts([Account::new("10001111", "Ada", dec!(100.00))])
    }

    fn record(status: TransactionStatus, risk_score: f64) -> TransactionRecord {
        let request = PaymentRequest {
            account_number: "10001111".to_string(),
            amount: dec!(10),
            security_pin: "0000".to_string(),
            payment_method: PaymentMethod::Crypto,
        };
        TransactionRecord::new(&request, status, risk_score)
    }

    #[tokio::test]
    async fn committed_debit_is_visible() {
        let ledger = ledger();

        let mut unit = ledger.begin().await.unwrap();
        assert_eq!(unit.debit("10001111", dec!(40)).await.unwrap(), dec!(60.00));
        unit.append_transaction(&record(TransactionStatus::Approved, 0.1))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(
            ledger.account("10001111").await.unwrap().current_balance,
            dec!(60.00)
        );
        assert_eq!(ledger.journal_for("10001111").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_unit_rolls_back() {
        let ledger = ledger();

        {
            let mut unit = ledger.begin().await.unwrap();
            unit.debit("10001111", dec!(40)).await.unwrap();
            unit.append_transaction(&record(TransactionStatus::Approved, 0.1))
                .await
                .unwrap();
        }

        assert_eq!(
            ledger.account("10001111").await.unwrap().current_balance,
            dec!(100.00)
        );
        assert!(ledger.journal_for("10001111").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn debit_never_overdraws() {
        let ledger = ledger();
        let mut unit = ledger.begin().await.unwrap();

        let err = unit.debit("10001111", dec!(100.01)).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
        assert_eq!(unit.get_balance("10001111").await.unwrap(), dec!(100.00));
    }

    #[tokio::test]
    async fn unknown_and_duplicate_accounts() {
        let ledger = ledger();
        let mut unit = ledger.begin().await.unwrap();

        assert!(matches!(
            unit.get_balance("99990000").await,
            Err(Error::AccountNotFound(_))
        ));
        assert!(matches!(
            unit.open_account(&Account::new("10001111", "Dup", dec!(1))).await,
            Err(Error::AccountExists(_))
        ));

        unit.open_account(&Account::new("99990000", "New", dec!(5)))
            .await
            .unwrap();
        assert_eq!(unit.get_balance("99990000").await.unwrap(), dec!(5));
    }

    #[tokio::test]
    async fn review_queries_order_by_risk() {
        let ledger = ledger();
        let mut unit = ledger.begin().await.unwrap();
        for (status, risk) in [
            (TransactionStatus::Flagged, 0.45),
            (TransactionStatus::Denied, 0.95),
            (TransactionStatus::Flagged, 0.75),
            (TransactionStatus::Approved, 0.05),
        ] {
            unit.append_transaction(&record(status, risk)).await.unwrap();
        }
        unit.commit().await.unwrap();

        let flagged = ledger
            .transactions_with_status(TransactionStatus::Flagged)
            .await
            .unwrap();
        let scores: Vec<f64> = flagged.iter().map(|r| r.risk_score).collect();
        assert_eq!(scores, vec![0.75, 0.45]);

        let top = ledger.highest_risk_transactions(2).await.unwrap();
        let scores: Vec<f64> = top.iter().map(|r| r.risk_score).collect();
        assert_eq!(scores, vec![0.95, 0.75]);
    }
}
