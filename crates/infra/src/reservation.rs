//! Reserve / release helpers over the movement processor.

use stockledger_inventory::{ApplyMovement, MovementType, StockKey, TransactionLogEntry};

use crate::error::LedgerError;
use crate::processor::MovementProcessor;
use crate::store::LedgerStore;

/// Earmarks stock for pending orders. Both operations are ordinary movements,
/// so they get the same atomicity, logging and retry behaviour.
pub struct Reservations<'a, S> {
    processor: &'a MovementProcessor<S>,
}

impl<'a, S> Reservations<'a, S>
where
    S: LedgerStore,
{
    pub(crate) fn new(processor: &'a MovementProcessor<S>) -> Self {
        Self { processor }
    }

    /// Fails with `InsufficientAvailableStock` when `on_hand - reserved < quantity`.
    pub async fn reserve(
        &self,
        key: StockKey,
        quantity: i64,
        operator: &str,
        note: &str,
    ) -> Result<TransactionLogEntry, LedgerError> {
        let cmd = ApplyMovement::new(key, MovementType::Reserve, quantity, operator).with_note(note);
        self.processor.apply_movement(cmd).await
    }

    /// Fails with `OverRelease` when `reserved < quantity`.
    pub async fn release(
        &self,
        key: StockKey,
        quantity: i64,
        operator: &str,
        note: &str,
    ) -> Result<TransactionLogEntry, LedgerError> {
        let cmd = ApplyMovement::new(key, MovementType::Release, quantity, operator).with_note(note);
        self.processor.apply_movement(cmd).await
    }
}
