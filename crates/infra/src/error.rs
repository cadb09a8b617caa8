use thiserror::Error;

use stockledger_inventory::{MovementError, Shortfall, TransactionLogEntry};

use crate::store::LedgerStoreError;

/// Caller-facing outcome of a rejected or failed ledger operation.
///
/// Business rejections (`Validation`, the insufficient-stock family) leave no
/// trace in storage. `ConcurrencyConflict` means the retry budget ran out while
/// other writers kept winning; the caller may simply try again.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock: {0}")]
    InsufficientStock(Shortfall),

    #[error("insufficient available stock: {0}")]
    InsufficientAvailableStock(Shortfall),

    #[error("release exceeds reserved stock: {0}")]
    OverRelease(Shortfall),

    #[error("concurrent modification after {attempts} attempts: {message}")]
    ConcurrencyConflict { attempts: u32, message: String },

    #[error("store error: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict { .. })
    }

    pub fn is_insufficient_stock(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientStock(_)
                | LedgerError::InsufficientAvailableStock(_)
                | LedgerError::OverRelease(_)
        )
    }
}

impl From<MovementError> for LedgerError {
    fn from(err: MovementError) -> Self {
        match err {
            MovementError::Validation(msg) => LedgerError::Validation(msg),
            MovementError::InsufficientStock(s) => LedgerError::InsufficientStock(s),
            MovementError::InsufficientAvailableStock(s) => LedgerError::InsufficientAvailableStock(s),
            MovementError::OverRelease(s) => LedgerError::OverRelease(s),
        }
    }
}

impl From<LedgerStoreError> for LedgerError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::Concurrency(message) => LedgerError::ConcurrencyConflict { attempts: 1, message },
            LedgerStoreError::Storage(msg) => LedgerError::Store(msg),
        }
    }
}

/// A batch stopped at `index`; `applied` holds the entries committed before it.
#[derive(Debug, Error)]
#[error("batch failed at index {index} after {} applied movement(s): {error}", .applied.len())]
pub struct BatchFailure {
    pub index: usize,
    pub applied: Vec<TransactionLogEntry>,
    #[source]
    pub error: LedgerError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_core::{ProductId, WarehouseId};
    use stockledger_inventory::{MovementType, StockKey};

    fn shortfall() -> Shortfall {
        Shortfall {
            key: StockKey::new(ProductId::new(), WarehouseId::new()),
            movement_type: MovementType::Reserve,
            requested: 5,
            on_hand: 4,
            reserved: 0,
        }
    }

    #[test]
    fn movement_errors_keep_their_kind() {
        let err: LedgerError = MovementError::InsufficientAvailableStock(shortfall()).into();
        assert!(matches!(err, LedgerError::InsufficientAvailableStock(_)));
        assert!(err.is_insufficient_stock());
        assert!(!err.is_retryable());

        let err: LedgerError = MovementError::validation("operator is required").into();
        assert!(matches!(err, LedgerError::Validation(ref m) if m == "operator is required"));
    }

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict: LedgerError = LedgerStoreError::Concurrency("raced".into()).into();
        assert!(conflict.is_retryable());
        let storage: LedgerError = LedgerStoreError::Storage("down".into()).into();
        assert!(!storage.is_retryable());
        assert!(matches!(storage, LedgerError::Store(_)));
    }

    #[test]
    fn batch_failure_reports_index() {
        let failure = BatchFailure {
            index: 2,
            applied: Vec::new(),
            error: LedgerError::Validation("quantity must be positive".into()),
        };
        let msg = failure.to_string();
        assert!(msg.contains("index 2"));
        assert!(msg.contains("0 applied"));
    }
}
