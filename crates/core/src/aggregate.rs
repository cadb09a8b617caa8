//! Versioned aggregates and the optimistic-concurrency expectation used to persist them.

use crate::error::{DomainError, DomainResult};

pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of changes applied since creation. `0` means never persisted.
    fn version(&self) -> u64;
}

/// Version a write expects to find in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Overwrite whatever is stored.
    Any,
    Exact(u64),
}

impl ExpectedVersion {
    /// Expect storage to still hold the version `aggregate` was loaded at.
    pub fn of<A: AggregateRoot>(aggregate: &A) -> Self {
        ExpectedVersion::Exact(aggregate.version())
    }

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            return Ok(());
        }
        Err(DomainError::conflict(format!(
            "expected version {self:?}, found {actual}"
        )))
    }
}

/// Command/event decision model, free of IO.
///
/// `handle` decides; it never mutates, so a rejected command leaves the
/// aggregate untouched. `apply` evolves state by exactly one version.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Self::Event, Self::Error>;
}
