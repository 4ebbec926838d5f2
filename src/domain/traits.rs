use async_trait::async_trait;
use futures::Stream;
use rust_decimal::Decimal;

use crate::domain::{Account, Error, TransactionRecord, TransactionStatus};
use crate::features::FeatureVector;

/// Source of accounts used to seed a ledger.
pub trait AccountStream {
    type AccountStream: Stream<Item = Result<Account, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::AccountStream;
}

/// Binary fraud classifier. Implementations must be deterministic for a given vector.
pub trait RiskScorer: Send + Sync {
    /// Probability in `[0, 1]` that the transaction is fraudulent.
    fn score(&self, features: &FeatureVector) -> Result<f64, Error>;
}

/// Placeholder for device and location signals.
pub trait DeviceSignal: Send + Sync {
    fn device_risk(&self) -> f64;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Unit: LedgerUnit;

    /// Starts an exclusive unit of work. Units against the same store are
    /// serialized; dropping a unit without committing discards its effects.
    async fn begin(&self) -> Result<Self::Unit, Error>;

    async fn account(&self, account_number: &str) -> Result<Account, Error>;

    async fn accounts(&self) -> Result<Vec<Account>, Error>;

    /// Journal entries with the given status, highest risk first.
    async fn transactions_with_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<TransactionRecord>, Error>;

    /// The `limit` highest-risk journal entries regardless of status.
    async fn highest_risk_transactions(&self, limit: usize)
    -> Result<Vec<TransactionRecord>, Error>;

    /// Journal entries for one account, oldest first.
    async fn journal_for(&self, account_number: &str) -> Result<Vec<TransactionRecord>, Error>;
}

#[async_trait]
pub trait LedgerUnit: Send {
    async fn get_balance(&mut self, account_number: &str) -> Result<Decimal, Error>;

    async fn open_account(&mut self, account: &Account) -> Result<(), Error>;

    /// Fails with `InsufficientFunds` rather than overdrawing. Returns the new balance.
    async fn debit(&mut self, account_number: &str, amount: Decimal) -> Result<Decimal, Error>;

    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<(), Error>;

    async fn commit(self) -> Result<(), Error>;
}
