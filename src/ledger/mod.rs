//! Ledger stores: account balances plus the transaction journal.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryLedger, MemoryUnit};
pub use sqlite::{SqliteLedger, SqliteUnit};
