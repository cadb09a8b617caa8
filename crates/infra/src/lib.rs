//! Infrastructure layer: ledger storage (in-memory and Postgres), the movement
//! processor, reservations, read-side queries, audit and configuration.

pub mod audit;
pub mod config;
pub mod error;
pub mod processor;
pub mod queries;
pub mod reservation;
pub mod retry;
pub mod store;


pub use audit::{AuditReport, Discrepancy, LedgerAuditor};
pub use config::{ConfigError, LedgerConfig, StoreBackend};
pub use error::{BatchFailure, LedgerError};
pub use processor::MovementProcessor;
pub use queries::StockQueries;
pub use reservation::Reservations;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use store::{
    HistoryFilter, InMemoryLedgerStore, LedgerStore, LedgerStoreError, Page, Pagination, PostgresLedgerStore,
    StockRecordStore, TransactionLog,
};
