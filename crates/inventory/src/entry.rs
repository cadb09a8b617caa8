//! Transaction log entries: the append-only audit trail of accepted movements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::movement::MovementType;
use crate::stock::{StockKey, StockMoved};

/// Store-assigned, monotonically increasing log position. Never reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A log entry ready to be appended (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub key: StockKey,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub operator: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl NewLogEntry {
    /// Attach the store-assigned id and commit timestamp.
    pub fn commit(self, id: TransactionId, created_at: DateTime<Utc>) -> TransactionLogEntry {
        TransactionLogEntry {
            id,
            key: self.key,
            movement_type: self.movement_type,
            quantity: self.quantity,
            operator: self.operator,
            note: self.note,
            created_at,
        }
    }
}

impl From<&StockMoved> for NewLogEntry {
    fn from(event: &StockMoved) -> Self {
        Self {
            key: event.key,
            movement_type: event.movement_type,
            quantity: event.quantity,
            operator: event.operator.clone(),
            note: event.note.clone(),
            created_at: event.occurred_at,
        }
    }
}

/// An immutable, committed movement record.
///
/// `quantity` is stored exactly as the caller gave it; the direction comes from
/// `movement_type` (and from the sign for `ADJUST`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLogEntry {
    pub id: TransactionId,
    pub key: StockKey,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub operator: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionLogEntry {
    /// `(on_hand_delta, reserved_delta)` this entry contributed.
    pub fn deltas(&self) -> (i64, i64) {
        self.movement_type.deltas(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockledger_core::{ProductId, WarehouseId};

    fn entry(t: MovementType, quantity: i64) -> TransactionLogEntry {
        NewLogEntry {
            key: StockKey::new(ProductId::new(), WarehouseId::new()),
            movement_type: t,
            quantity,
            operator: "op".to_string(),
            note: String::new(),
            created_at: Utc::now(),
        }
        .commit(TransactionId::new(7), Utc::now())
    }

    #[test]
    fn commit_assigns_id() {
        let e = entry(MovementType::In, 3);
        assert_eq!(e.id.value(), 7);
        assert_eq!(e.id.to_string(), "7");
    }

    #[test]
    fn deltas_derive_from_type() {
        assert_eq!(entry(MovementType::Sale, 4).deltas(), (-4, 0));
        assert_eq!(entry(MovementType::Release, 2).deltas(), (0, -2));
        assert_eq!(entry(MovementType::Adjust, -9).deltas(), (-9, 0));
    }

    #[test]
    fn serializes_movement_type_by_wire_name() {
        let json = serde_json::to_value(entry(MovementType::TransferOut, 1)).unwrap();
        assert_eq!(json["movement_type"], "TRANSFER_OUT");
        assert_eq!(json["id"], 7);
    }
}
