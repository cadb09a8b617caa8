use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ProductId, WarehouseId};

use crate::error::MovementError;
use crate::stock::StockKey;

/// Kind of stock movement. Determines how `quantity` moves on-hand and reserved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,
    Out,
    Sale,
    Reserve,
    Release,
    Adjust,
    TransferIn,
    TransferOut,
    Return,
    Damage,
    Expired,
    Stolen,
}

/// Effect of a movement type on the physical (on-hand) quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

/// Catalogue entry describing a movement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementTypeInfo {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub name: &'static str,
    pub description: &'static str,
    pub impact: Impact,
}

impl MovementType {
    pub const ALL: [MovementType; 12] = [
        MovementType::In,
        MovementType::Out,
        MovementType::Sale,
        MovementType::Reserve,
        MovementType::Release,
        MovementType::Adjust,
        MovementType::TransferIn,
        MovementType::TransferOut,
        MovementType::Return,
        MovementType::Damage,
        MovementType::Expired,
        MovementType::Stolen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Sale => "SALE",
            MovementType::Reserve => "RESERVE",
            MovementType::Release => "RELEASE",
            MovementType::Adjust => "ADJUST",
            MovementType::TransferIn => "TRANSFER_IN",
            MovementType::TransferOut => "TRANSFER_OUT",
            MovementType::Return => "RETURN",
            MovementType::Damage => "DAMAGE",
            MovementType::Expired => "EXPIRED",
            MovementType::Stolen => "STOLEN",
        }
    }

    /// Direction of the on-hand change: `1` increase, `-1` decrease, `0` none or caller-signed.
    pub fn direction(self) -> i64 {
        match self {
            MovementType::In | MovementType::TransferIn | MovementType::Return => 1,
            MovementType::Out
            | MovementType::Sale
            | MovementType::TransferOut
            | MovementType::Damage
            | MovementType::Expired
            | MovementType::Stolen => -1,
            MovementType::Reserve | MovementType::Release | MovementType::Adjust => 0,
        }
    }

    pub fn impact(self) -> Impact {
        match self.direction() {
            1 => Impact::Positive,
            -1 => Impact::Negative,
            _ => Impact::Neutral,
        }
    }

    /// `ADJUST` carries a signed delta; every other type a positive magnitude.
    pub fn is_signed(self) -> bool {
        self == MovementType::Adjust
    }

    /// `(on_hand_delta, reserved_delta)` for a validated quantity.
    pub fn deltas(self, quantity: i64) -> (i64, i64) {
        match self {
            MovementType::Reserve => (0, quantity),
            MovementType::Release => (0, -quantity),
            MovementType::Adjust => (quantity, 0),
            other => (other.direction() * quantity, 0),
        }
    }

    pub fn info(self) -> MovementTypeInfo {
        let (name, description) = match self {
            MovementType::In => ("Stock in", "Goods received into the warehouse; increases on-hand"),
            MovementType::Out => ("Stock out", "Goods issued from the warehouse; decreases on-hand"),
            MovementType::Sale => ("Sale", "Goods sold and shipped; decreases on-hand"),
            MovementType::Reserve => (
                "Reserve",
                "Earmarks stock for an order; on-hand unchanged, available decreases",
            ),
            MovementType::Release => (
                "Release",
                "Returns reserved stock to available; on-hand unchanged",
            ),
            MovementType::Adjust => (
                "Adjustment",
                "Stocktake correction by a signed delta; may increase or decrease on-hand",
            ),
            MovementType::TransferIn => ("Transfer in", "Received from another warehouse; increases on-hand"),
            MovementType::TransferOut => ("Transfer out", "Sent to another warehouse; decreases on-hand"),
            MovementType::Return => ("Customer return", "Goods returned by a customer; increases on-hand"),
            MovementType::Damage => ("Damaged", "Goods written off as damaged; decreases on-hand"),
            MovementType::Expired => ("Expired", "Goods written off as expired; decreases on-hand"),
            MovementType::Stolen => ("Lost or stolen", "Goods missing or stolen; decreases on-hand"),
        };
        MovementTypeInfo {
            movement_type: self,
            name,
            description,
            impact: self.impact(),
        }
    }

    /// The full movement-type catalogue, in declaration order.
    pub fn catalog() -> Vec<MovementTypeInfo> {
        Self::ALL.iter().map(|t| t.info()).collect()
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = MovementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MovementError::validation(format!("unknown movement type '{s}'")))
    }
}

/// Command: apply one movement to one stock key.
///
/// `occurred_at` is re-stamped by the movement processor on every commit
/// attempt, so the log reflects when the movement actually landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyMovement {
    pub key: StockKey,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub operator: String,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl ApplyMovement {
    pub fn new(
        key: StockKey,
        movement_type: MovementType,
        quantity: i64,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            key,
            movement_type,
            quantity,
            operator: operator.into(),
            note: String::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Input validation independent of current stock.
    pub fn validate(&self) -> Result<(), MovementError> {
        self.key.product_id.ensure_present()?;
        self.key.warehouse_id.ensure_present()?;

        if self.operator.trim().is_empty() {
            return Err(MovementError::validation("operator is required"));
        }

        if self.movement_type.is_signed() {
            if self.quantity == 0 {
                return Err(MovementError::validation("adjustment delta cannot be zero"));
            }
        } else if self.quantity <= 0 {
            return Err(MovementError::validation("quantity must be positive"));
        }

        Ok(())
    }
}

/// One line of a batch: the movement without the batch-level operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub note: String,
}

impl MovementRequest {
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        movement_type: MovementType,
        quantity: i64,
    ) -> Self {
        Self {
            product_id,
            warehouse_id,
            movement_type,
            quantity,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.product_id, self.warehouse_id)
    }

    pub fn into_command(self, operator: impl Into<String>) -> ApplyMovement {
        let key = self.key();
        ApplyMovement::new(key, self.movement_type, self.quantity, operator).with_note(self.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StockKey {
        StockKey::new(ProductId::new(), WarehouseId::new())
    }

    #[test]
    fn parses_known_types_case_insensitively() {
        assert_eq!("IN".parse::<MovementType>().unwrap(), MovementType::In);
        assert_eq!("transfer_out".parse::<MovementType>().unwrap(), MovementType::TransferOut);
        for t in MovementType::ALL {
            assert_eq!(t.as_str().parse::<MovementType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let err = "TELEPORT".parse::<MovementType>().unwrap_err();
        assert!(matches!(err, MovementError::Validation(_)));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&MovementType::TransferIn).unwrap();
        assert_eq!(json, "\"TRANSFER_IN\"");
        let back: MovementType = serde_json::from_str("\"STOLEN\"").unwrap();
        assert_eq!(back, MovementType::Stolen);
    }

    #[test]
    fn deltas_follow_the_movement_table() {
        assert_eq!(MovementType::In.deltas(5), (5, 0));
        assert_eq!(MovementType::TransferIn.deltas(5), (5, 0));
        assert_eq!(MovementType::Return.deltas(5), (5, 0));
        for t in [
            MovementType::Out,
            MovementType::Sale,
            MovementType::TransferOut,
            MovementType::Damage,
            MovementType::Expired,
            MovementType::Stolen,
        ] {
            assert_eq!(t.deltas(5), (-5, 0), "{t}");
            assert_eq!(t.impact(), Impact::Negative);
        }
        assert_eq!(MovementType::Reserve.deltas(5), (0, 5));
        assert_eq!(MovementType::Release.deltas(5), (0, -5));
        assert_eq!(MovementType::Adjust.deltas(-7), (-7, 0));
        assert_eq!(MovementType::Adjust.impact(), Impact::Neutral);
    }

    #[test]
    fn catalog_lists_every_type_once() {
        let catalog = MovementType::catalog();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog[0].movement_type, MovementType::In);
        assert_eq!(catalog[0].impact, Impact::Positive);
        let json = serde_json::to_value(&catalog[3]).unwrap();
        assert_eq!(json["type"], "RESERVE");
        assert_eq!(json["impact"], "neutral");
    }

    #[test]
    fn validate_rejects_bad_input() {
        let k = key();
        assert!(ApplyMovement::new(k, MovementType::In, 0, "op").validate().is_err());
        assert!(ApplyMovement::new(k, MovementType::Sale, -3, "op").validate().is_err());
        assert!(ApplyMovement::new(k, MovementType::In, 3, "   ").validate().is_err());
        assert!(ApplyMovement::new(k, MovementType::Adjust, 0, "op").validate().is_err());
        assert!(ApplyMovement::new(k, MovementType::Adjust, -3, "op").validate().is_ok());
        assert!(ApplyMovement::new(k, MovementType::In, 3, "op").validate().is_ok());

        let nil = StockKey::new(ProductId::from_uuid(uuid::Uuid::nil()), WarehouseId::new());
        let err = ApplyMovement::new(nil, MovementType::In, 3, "op").validate().unwrap_err();
        assert!(matches!(err, MovementError::Validation(msg) if msg.contains("ProductId")));
    }

    #[test]
    fn batch_request_becomes_command() {
        let req = MovementRequest::new(ProductId::new(), WarehouseId::new(), MovementType::Out, 4)
            .with_note("pick #12");
        let cmd = req.clone().into_command("clerk");
        assert_eq!(cmd.key, req.key());
        assert_eq!(cmd.operator, "clerk");
        assert_eq!(cmd.note, "pick #12");
        assert_eq!(cmd.quantity, 4);
    }

    #[test]
    fn batch_request_deserializes_without_note() {
        let p = ProductId::new();
        let w = WarehouseId::new();
        let json = format!(r#"{{"product_id":"{p}","warehouse_id":"{w}","type":"IN","quantity":3}}"#);
        let req: MovementRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.movement_type, MovementType::In);
        assert!(req.note.is_empty());
    }
}
