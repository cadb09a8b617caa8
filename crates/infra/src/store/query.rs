//! Pagination and filter types shared by the read paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ProductId, WarehouseId};
use stockledger_inventory::{MovementType, TransactionLogEntry};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }

    /// Slice an already-ordered, fully materialised result set.
    pub fn apply<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let page: Vec<T> = items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect();
        Page::new(page, total, self)
    }
}

/// One page of results plus the total matching count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items matching the query (across all pages).
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);
        Self {
            items,
            total,
            pagination,
            has_more,
        }
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }
}

/// Filter criteria for transaction history. Every field is optional; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub movement_type: Option<MovementType>,
    pub occurred_after: Option<DateTime<Utc>>,
    pub occurred_before: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    pub fn for_warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
            ..Default::default()
        }
    }

    pub fn with_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.occurred_after = Some(from);
        self.occurred_before = Some(to);
        self
    }

    pub fn matches(&self, entry: &TransactionLogEntry) -> bool {
        self.product_id.is_none_or(|p| entry.key.product_id == p)
            && self.warehouse_id.is_none_or(|w| entry.key.warehouse_id == w)
            && self.movement_type.is_none_or(|t| entry.movement_type == t)
            && self.occurred_after.is_none_or(|from| entry.created_at >= from)
            && self.occurred_before.is_none_or(|to| entry.created_at <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_caps_limit() {
        let p = Pagination::new(Some(5000), None);
        assert_eq!(p.limit, Pagination::MAX_LIMIT);
        assert_eq!(p.offset, 0);
        assert_eq!(Pagination::new(None, Some(3)).limit, 50);
    }

    #[test]
    fn apply_slices_and_counts() {
        let page = Pagination::new(Some(2), Some(1)).apply(vec![1, 2, 3, 4]);
        assert_eq!(page.items, vec![2, 3]);
        assert_eq!(page.total, 4);
        assert!(page.has_more);

        let last = Pagination::new(Some(2), Some(2)).apply(vec![1, 2, 3, 4]);
        assert_eq!(last.items, vec![3, 4]);
        assert!(!last.has_more);

        let beyond = Pagination::new(Some(2), Some(10)).apply(vec![1, 2, 3]);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 3);
    }
}
