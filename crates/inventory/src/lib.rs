//! Stock ledger domain module.
//!
//! Business rules for per-warehouse stock, implemented purely as deterministic
//! domain logic (no IO, no storage). Infrastructure lives in `stockledger-infra`.

pub mod entry;
pub mod error;
pub mod movement;
pub mod stock;

pub use entry::{NewLogEntry, TransactionId, TransactionLogEntry};
pub use error::{MovementError, Shortfall};
pub use movement::{ApplyMovement, Impact, MovementRequest, MovementType, MovementTypeInfo};
pub use stock::{StockKey, StockMoved, StockRecord, StockSummary};
