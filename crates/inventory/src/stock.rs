use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{Aggregate, AggregateRoot, ProductId, WarehouseId};

use crate::entry::TransactionLogEntry;
use crate::error::{MovementError, Shortfall};
use crate::movement::{ApplyMovement, MovementType};

/// Stock key: one product held in one warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.product_id, self.warehouse_id)
    }
}

/// Aggregate root: the stock snapshot for one key.
///
/// The snapshot is a materialised projection of the transaction log; it is
/// authoritative for reads while the log is authoritative for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    key: StockKey,
    on_hand: i64,
    reserved: i64,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Zero-valued, not-yet-persisted record (version 0).
    pub fn empty(key: StockKey) -> Self {
        Self {
            key,
            on_hand: 0,
            reserved: 0,
            version: 0,
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Rebuild a record from storage columns.
    pub fn from_parts(
        key: StockKey,
        on_hand: i64,
        reserved: i64,
        version: u64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            on_hand,
            reserved,
            version,
            updated_at,
        }
    }

    /// Fold a key's log (in id order) into the snapshot it implies.
    ///
    /// No invariant checks: the audit uses this to compare against the stored snapshot.
    pub fn from_log<'a>(key: StockKey, entries: impl IntoIterator<Item = &'a TransactionLogEntry>) -> Self {
        let mut record = Self::empty(key);
        for entry in entries {
            let (on_hand_delta, reserved_delta) = entry.deltas();
            record.on_hand = record.on_hand.saturating_add(on_hand_delta);
            record.reserved = record.reserved.saturating_add(reserved_delta);
            record.version += 1;
            record.updated_at = entry.created_at;
        }
        record
    }

    pub fn key(&self) -> StockKey {
        self.key
    }

    pub fn product_id(&self) -> ProductId {
        self.key.product_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.key.warehouse_id
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// `on_hand ≥ 0 ∧ reserved ≥ 0 ∧ reserved ≤ on_hand`.
    pub fn satisfies_invariants(&self) -> bool {
        Self::invariants_hold(self.on_hand, self.reserved)
    }

    /// Administrative overwrite of the quantities (store `upsert` path).
    pub fn with_quantities(mut self, on_hand: i64, reserved: i64, at: DateTime<Utc>) -> Self {
        self.on_hand = on_hand;
        self.reserved = reserved;
        self.updated_at = at;
        self
    }

    /// Bump the version without touching quantities (used when a snapshot is overwritten).
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    fn invariants_hold(on_hand: i64, reserved: i64) -> bool {
        on_hand >= 0 && reserved >= 0 && reserved <= on_hand
    }

    fn shortfall(&self, cmd: &ApplyMovement) -> Shortfall {
        Shortfall {
            key: self.key,
            movement_type: cmd.movement_type,
            requested: cmd.quantity,
            on_hand: self.on_hand,
            reserved: self.reserved,
        }
    }
}

impl AggregateRoot for StockRecord {
    type Id = StockKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: one accepted movement with its resolved deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub key: StockKey,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub on_hand_delta: i64,
    pub reserved_delta: i64,
    pub operator: String,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl Aggregate for StockRecord {
    type Command = ApplyMovement;
    type Event = StockMoved;
    type Error = MovementError;

    fn apply(&mut self, event: &Self::Event) {
        self.on_hand += event.on_hand_delta;
        self.reserved += event.reserved_delta;
        self.updated_at = event.occurred_at;
        self.version += 1;
    }

    fn handle(&self, cmd: &Self::Command) -> Result<Self::Event, Self::Error> {
        cmd.validate()?;
        if cmd.key != self.key {
            return Err(MovementError::validation(format!(
                "movement for {} routed to stock record {}",
                cmd.key, self.key
            )));
        }

        let (on_hand_delta, reserved_delta) = cmd.movement_type.deltas(cmd.quantity);
        let new_on_hand = self
            .on_hand
            .checked_add(on_hand_delta)
            .ok_or_else(|| MovementError::validation("on-hand quantity overflow"))?;
        let new_reserved = self
            .reserved
            .checked_add(reserved_delta)
            .ok_or_else(|| MovementError::validation("reserved quantity overflow"))?;

        if !Self::invariants_hold(new_on_hand, new_reserved) {
            let shortfall = self.shortfall(cmd);
            return Err(match cmd.movement_type {
                MovementType::Reserve => MovementError::InsufficientAvailableStock(shortfall),
                MovementType::Release => MovementError::OverRelease(shortfall),
                _ => MovementError::InsufficientStock(shortfall),
            });
        }

        Ok(StockMoved {
            key: self.key,
            movement_type: cmd.movement_type,
            quantity: cmd.quantity,
            on_hand_delta,
            reserved_delta,
            operator: cmd.operator.trim().to_string(),
            note: cmd.note.clone(),
            occurred_at: cmd.occurred_at,
        })
    }
}

/// Totals for one product across every warehouse holding it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_on_hand: i64,
    pub total_reserved: i64,
    pub total_available: i64,
    pub warehouse_count: usize,
}

impl StockSummary {
    /// Fails when a total does not fit in `i64`; each record can hold up to
    /// `i64::MAX` on its own.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a StockRecord>,
    ) -> Result<Self, MovementError> {
        records
            .into_iter()
            .try_fold(StockSummary::default(), |acc, r| {
                let overflow =
                    || MovementError::validation(format!("stock totals for product {} overflow", r.key.product_id));
                Ok(StockSummary {
                    total_on_hand: acc.total_on_hand.checked_add(r.on_hand()).ok_or_else(overflow)?,
                    total_reserved: acc.total_reserved.checked_add(r.reserved()).ok_or_else(overflow)?,
                    total_available: acc.total_available.checked_add(r.available()).ok_or_else(overflow)?,
                    warehouse_count: acc.warehouse_count + 1,
                })
            })
    }
}
