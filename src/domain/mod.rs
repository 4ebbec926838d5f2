pub mod account;
pub mod error;
pub mod request;
pub mod traits;
pub mod transaction;

pub use account::Account;
pub use error::Error;
pub use request::{PaymentPayload, PaymentRequest};
pub use traits::{AccountStream, DeviceSignal, LedgerStore, LedgerUnit, RiskScorer};
pub use transaction::{PaymentMethod, TransactionRecord, TransactionStatus};
