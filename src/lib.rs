//! VMB payment gateway: fraud-scored payment processing over an
//! append-only SQLite ledger.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod features;
pub mod ingestion;
pub mod ledger;
pub mod policy;
pub mod review;
pub mod scorer;
