//! Store module
//!
//! In-memory record store with all-or-nothing transactions.
//! Records stage their writes on a [`Transaction`]; nothing is visible
//! until the transaction commits.

mod error;
mod repository;

pub use error::{StoreError, StoreResult};
pub use repository::{Row, Store, StoreStats, Transaction, TransactionState};
