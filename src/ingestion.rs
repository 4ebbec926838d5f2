use std::io::Read;
use std::pin::Pin;

use futures::StreamExt;
use futures::stream::{self, Stream};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::traits::AccountStream;
use crate::domain::{Account, Error, LedgerStore, LedgerUnit};
use crate::features::ACCOUNT_PREFIX_LEN;

/// Reads `account_number,customer_name,current_balance` rows.
pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self { reader: Some(rdr) }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    account_number: String,
    customer_name: String,
    current_balance: Decimal,
}

impl TryFrom<CsvRow> for Account {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self, Self::Error> {
        if row.account_number.chars().count() < ACCOUNT_PREFIX_LEN {
            return Err(Error::Ingestion(format!(
                "Account number too short: {:?}",
                row.account_number
            )));
        }
        if row.current_balance.is_sign_negative() {
            return Err(Error::Ingestion(format!(
                "Negative opening balance for {}: {}",
                row.account_number, row.current_balance
            )));
        }

        Ok(Account::new(
            row.account_number,
            row.customer_name,
            row.current_balance,
        ))
    }
}

impl<R: Read + Send + 'static> AccountStream for CsvReader<R> {
    type AccountStream = Pin<Box<dyn Stream<Item = Result<Account, Error>> + Send>>;

    fn stream(&mut self) -> Self::AccountStream {
        let Some(reader) = self.reader.take() else {
            return Box::pin(stream::empty::<Result<Account, Error>>());
        };

        let iter = reader
            .into_deserialize::<CsvRow>()
            .map(|row_res| match row_res {
                Ok(row) => Account::try_from(row),
                Err(e) => Err(Error::Ingestion(format!(
                    "CSV deserialization error: {}",
                    e
                ))),
            });

        Box::pin(stream::iter(iter))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub opened: usize,
    pub skipped: usize,
}

/// Open every account the stream yields. Malformed rows and accounts that
/// already exist are logged and skipped; storage failures abort the seed.
pub async fn seed_ledger<L, I>(ledger: &L, source: &mut I) -> Result<SeedReport, Error>
where
    L: LedgerStore,
    I: AccountStream,
{
    let mut report = SeedReport::default();
    let mut accounts = source.stream();

    while let Some(account) = accounts.next().await {
        let account = match account {
            Ok(account) => account,
            Err(e) => {
                warn!(error = %e, "Skipping account row");
                report.skipped += 1;
                continue;
            }
        };

        let mut unit = ledger.begin().await?;
        match unit.open_account(&account).await {
            Ok(()) => {
                unit.commit().await?;
                report.opened += 1;
            }
            Err(Error::AccountExists(number)) => {
                warn!(account = %number, "Account already exists, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        opened = report.opened,
        skipped = report.skipped,
        "Ledger seeding finished"
    );
    Ok(report)
}
