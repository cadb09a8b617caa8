//! Domain primitives shared by the ledger crates: typed ids, versioned
//! aggregates and the domain error type. No IO.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{ProductId, WarehouseId};
