//! Ledger storage boundary.
//!
//! The snapshot store and the transaction log are separate read interfaces
//! that share one atomic write path (`LedgerStore::commit`), so a snapshot
//! change and its log entry are never observed apart.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::{HistoryFilter, Page, Pagination};
pub use r#trait::{LedgerStore, LedgerStoreError, StockRecordStore, TransactionLog};
