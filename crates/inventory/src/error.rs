use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockledger_core::DomainError;

use crate::movement::MovementType;
use crate::stock::StockKey;

/// Snapshot of the state a movement was rejected against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub key: StockKey,
    pub movement_type: MovementType,
    pub requested: i64,
    pub on_hand: i64,
    pub reserved: i64,
}

impl Shortfall {
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }
}

impl core::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} of {} at {} (on_hand={}, reserved={}, available={})",
            self.movement_type,
            self.requested,
            self.key,
            self.on_hand,
            self.reserved,
            self.available()
        )
    }
}

/// Deterministic rejection of a movement by the stock domain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    /// Malformed request (non-positive quantity, empty operator, missing id, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The movement would leave on-hand negative or below the reserved quantity.
    #[error("insufficient stock: {0}")]
    InsufficientStock(Shortfall),

    /// A reservation asked for more than is currently available.
    #[error("insufficient available stock: {0}")]
    InsufficientAvailableStock(Shortfall),

    /// A release asked for more than is currently reserved.
    #[error("release exceeds reserved quantity: {0}")]
    OverRelease(Shortfall),
}

impl MovementError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for every flavour of stock shortage (the specialisations included).
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(
            self,
            MovementError::InsufficientStock(_)
                | MovementError::InsufficientAvailableStock(_)
                | MovementError::OverRelease(_)
        )
    }

    pub fn shortfall(&self) -> Option<&Shortfall> {
        match self {
            MovementError::Validation(_) => None,
            MovementError::InsufficientStock(s)
            | MovementError::InsufficientAvailableStock(s)
            | MovementError::OverRelease(s) => Some(s),
        }
    }
}

impl From<DomainError> for MovementError {
    fn from(value: DomainError) -> Self {
        MovementError::Validation(value.to_string())
    }
}
