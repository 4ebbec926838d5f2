//! SQLite ledger backed by sqlx.
//!
//! Balances and amounts are stored as TEXT so decimals survive unchanged.
//! Units of work run inside a database transaction and additionally hold an
//! async write lock, so the balance read, debit and journal insert of one
//! payment cannot interleave with another payment's.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{
    Account, Error, LedgerStore, LedgerUnit, PaymentMethod, TransactionRecord, TransactionStatus,
};

const TRANSACTION_COLUMNS: &str =
    "id, account_number, amount, payment_method, timestamp, status, risk_score, is_fraud";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    account_number: String,
    customer_name: String,
    current_balance: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            current_balance: parse_decimal(&row.current_balance)?,
            account_number: row.account_number,
            customer_name: row.customer_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    account_number: String,
    amount: String,
    payment_method: String,
    timestamp: DateTime<Utc>,
    status: String,
    risk_score: f64,
    is_fraud: bool,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(TransactionRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| Error::Ledger(format!("Invalid transaction id {}: {}", row.id, e)))?,
            amount: parse_decimal(&row.amount)?,
            payment_method: PaymentMethod::parse(&row.payment_method),
            status: row.status.parse::<TransactionStatus>()?,
            account_number: row.account_number,
            timestamp: row.timestamp,
            risk_score: row.risk_score,
            is_fraud_label: row.is_fraud,
        })
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, Error> {
    Decimal::from_str(raw).map_err(|e| Error::Ledger(format!("Invalid decimal {}: {}", raw, e)))
}

fn into_records(rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>, Error> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteLedger {
    /// Connect, creating the database file if it does not exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %config.url, "Connected to ledger database");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    type Unit = SqliteUnit;

    async fn begin(&self) -> Result<SqliteUnit, Error> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(SqliteUnit { tx, _guard: guard })
    }

    async fn account(&self, account_number: &str) -> Result<Account, Error> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT account_number, customer_name, current_balance FROM accounts WHERE account_number = ?",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::AccountNotFound(account_number.to_string()))?
        .try_into()
    }

    async fn accounts(&self) -> Result<Vec<Account>, Error> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT account_number, customer_name, current_balance FROM accounts ORDER BY account_number",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Account::try_from)
        .collect()
    }

    async fn transactions_with_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE status = ? ORDER BY risk_score DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn highest_risk_transactions(
        &self,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions ORDER BY risk_score DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn journal_for(&self, account_number: &str) -> Result<Vec<TransactionRecord>, Error> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE account_number = ? ORDER BY timestamp",
            TRANSACTION_COLUMNS
        ))
        .bind(account_number)
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }
}

/// Rolled back on drop unless committed. Field order matters: the
/// transaction must finish before the write lock is released.
pub struct SqliteUnit {
    tx: sqlx::Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl LedgerUnit for SqliteUnit {
    async fn get_balance(&mut self, account_number: &str) -> Result<Decimal, Error> {
        let balance: Option<String> =
            sqlx::query_scalar("SELECT current_balance FROM accounts WHERE account_number = ?")
                .bind(account_number)
                .fetch_optional(&mut *self.tx)
                .await?;

        match balance {
            Some(raw) => parse_decimal(&raw),
            None => Err(Error::AccountNotFound(account_number.to_string())),
        }
    }

    async fn open_account(&mut self, account: &Account) -> Result<(), Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO accounts (account_number, customer_name, current_balance) VALUES (?, ?, ?)",
        )
        .bind(&account.account_number)
        .bind(&account.customer_name)
        .bind(account.current_balance.to_string())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountExists(account.account_number.clone()));
        }
        Ok(())
    }

    async fn debit(&mut self, account_number: &str, amount: Decimal) -> Result<Decimal, Error> {
        let balance = self.get_balance(account_number).await?;

        if balance < amount {
            return Err(Error::InsufficientFunds(account_number.to_string()));
        }

        let new_balance = balance - amount;
        sqlx::query("UPDATE accounts SET current_balance = ? WHERE account_number = ?")
            .bind(new_balance.to_string())
            .bind(account_number)
            .execute(&mut *self.tx)
            .await?;

        Ok(new_balance)
    }

    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<(), Error> {
        sqlx::query(&format!(
            "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            TRANSACTION_COLUMNS
        ))
        .bind(record.id.to_string())
        .bind(&record.account_number)
        .bind(record.amount.to_string())
        .bind(record.payment_method.as_str())
        .bind(record.timestamp)
        .bind(record.status.as_str())
        .bind(record.risk_score)
        .bind(record.is_fraud_label)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), Error> {
        self.tx.commit().await?;
        Ok(())
    }
}
