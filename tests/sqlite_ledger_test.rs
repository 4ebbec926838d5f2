mod common;

use std::path::Path;
use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use tempfile::TempDir;

use common::{ACCOUNT, FixedScorer, payment};
use vmb_gateway::config::{AccountsConfig, DatabaseConfig};
use vmb_gateway::domain::{
    Account, Error, LedgerStore, LedgerUnit, TransactionStatus,
};
use vmb_gateway::engine::Engine;
use vmb_gateway::features::{FeatureExtractor, FixedDeviceSignal};
use vmb_gateway::ledger::SqliteLedger;

fn database(dir: &Path) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.join("ledger.db").display()),
        max_connections: 4,
    }
}

async fn ledger_with_account(dir: &TempDir, balance: rust_decimal::Decimal) -> SqliteLedger {
    let ledger = SqliteLedger::connect(&database(dir.path())).await.unwrap();
    ledger.migrate().await.unwrap();

    let mut unit = ledger.begin().await.unwrap();
    unit.open_account(&Account::new(ACCOUNT, "Grace Hopper", balance))
        .await
        .unwrap();
    unit.commit().await.unwrap();
    ledger
}

fn engine(
    score: f64,
    ledger: SqliteLedger,
) -> Engine<FixedScorer, SqliteLedger, FixedDeviceSignal> {
    Engine::new(
        FixedScorer(score),
        ledger,
        FeatureExtractor::new(FixedDeviceSignal(0.3)),
        AccountsConfig::default(),
    )
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SqliteLedger::connect(&database(dir.path())).await.unwrap();

    ledger.migrate().await.unwrap();
    ledger.migrate().await.unwrap();

    assert!(ledger.accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn decimals_survive_a_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(1234.56)).await;

    let outcome = engine(0.1, ledger).process(payment(ACCOUNT, json!("0.01"))).await.unwrap();
    assert_eq!(outcome.balance, Some(dec!(1234.55)));

    let reopened = SqliteLedger::connect(&database(dir.path())).await.unwrap();
    let account = reopened.account(ACCOUNT).await.unwrap();
    assert_eq!(account.current_balance, dec!(1234.55));
    assert_eq!(account.current_balance.to_string(), "1234.55");

    let journal = reopened.journal_for(ACCOUNT).await.unwrap();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].id, outcome.transaction_id);
    assert_eq!(journal[0].amount, dec!(0.01));
    assert_eq!(journal[0].status, TransactionStatus::Approved);
}

#[tokio::test]
async fn dropped_unit_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(100)).await;

    {
        let mut unit = ledger.begin().await.unwrap();
        unit.debit(ACCOUNT, dec!(60)).await.unwrap();
    }

    assert_eq!(ledger.account(ACCOUNT).await.unwrap().current_balance, dec!(100));
}

#[tokio::test]
async fn debit_refuses_to_overdraw() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(10)).await;

    let mut unit = ledger.begin().await.unwrap();
    let err = unit.debit(ACCOUNT, dec!(10.01)).await.unwrap_err();

    assert!(matches!(err, Error::InsufficientFunds(_)));
}

#[tokio::test]
async fn duplicate_account_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(10)).await;

    let mut unit = ledger.begin().await.unwrap();
    let err = unit
        .open_account(&Account::new(ACCOUNT, "Impostor", dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AccountExists(_)));
}

#[tokio::test]
async fn journal_rejects_updates_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(100)).await;
    let engine = engine(0.5, ledger);
    engine.process(payment(ACCOUNT, json!(1))).await.unwrap();

    let pool = engine.ledger().pool();
    assert!(
        sqlx::query("UPDATE transactions SET status = 'Approved'")
            .execute(pool)
            .await
            .is_err()
    );
    assert!(sqlx::query("DELETE FROM transactions").execute(pool).await.is_err());

    let flagged = engine
        .ledger()
        .transactions_with_status(TransactionStatus::Flagged)
        .await
        .unwrap();
    assert_eq!(flagged.len(), 1);
}

#[tokio::test]
async fn denials_are_journaled() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(100)).await;
    let engine = engine(0.1, ledger);

    engine.process(payment(ACCOUNT, json!(500))).await.unwrap();
    engine.process(payment("88887777", json!(5))).await.unwrap();

    let denied = engine
        .ledger()
        .transactions_with_status(TransactionStatus::Denied)
        .await
        .unwrap();
    assert_eq!(denied.len(), 2);
    assert_eq!(
        engine.ledger().account(ACCOUNT).await.unwrap().current_balance,
        dec!(100)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_never_double_spend() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = ledger_with_account(&dir, dec!(100)).await;
    let engine = Arc::new(engine(0.1, ledger));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.process(payment(ACCOUNT, json!(20))).await })
        })
        .collect();

    let mut approved = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap().status {
            TransactionStatus::Approved => approved += 1,
            TransactionStatus::Denied => denied += 1,
            TransactionStatus::Flagged => unreachable!("fixed low score"),
        }
    }

    assert_eq!(approved, 5);
    assert_eq!(denied, 5);
    assert_eq!(
        engine.ledger().account(ACCOUNT).await.unwrap().current_balance,
        dec!(0)
    );
    assert_eq!(engine.ledger().journal_for(ACCOUNT).await.unwrap().len(), 10);
}
