//! Read-side queries over stock snapshots and the transaction log.
//!
//! Absent keys produce empty results or `None`, never errors.

use tracing::instrument;

use stockledger_core::{ProductId, WarehouseId};
use stockledger_inventory::{MovementType, MovementTypeInfo, StockKey, StockRecord, StockSummary, TransactionLogEntry};

use crate::error::LedgerError;
use crate::store::{HistoryFilter, Page, Pagination, StockRecordStore, TransactionLog};

#[derive(Debug, Clone)]
pub struct StockQueries<S> {
    store: S,
}

impl<S> StockQueries<S>
where
    S: StockRecordStore + TransactionLog,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every warehouse position for one product.
    pub async fn stock_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, LedgerError> {
        Ok(self.store.list_by_product(product_id).await?)
    }

    pub async fn stock_by_product_and_warehouse(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<StockRecord>, LedgerError> {
        Ok(self.store.get(StockKey::new(product_id, warehouse_id)).await?)
    }

    pub async fn stock_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        pagination: Pagination,
    ) -> Result<Page<StockRecord>, LedgerError> {
        Ok(self.store.list_by_warehouse(warehouse_id, pagination).await?)
    }

    /// Totals across all warehouses; zeros for a product with no stock.
    /// Totals that overflow `i64` come back as `LedgerError::Validation`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn summary(&self, product_id: ProductId) -> Result<StockSummary, LedgerError> {
        let records = self.store.list_by_product(product_id).await?;
        Ok(StockSummary::from_records(&records)?)
    }

    /// Newest-first movement history.
    pub async fn history(
        &self,
        filter: HistoryFilter,
        pagination: Pagination,
    ) -> Result<Page<TransactionLogEntry>, LedgerError> {
        if let (Some(from), Some(to)) = (filter.occurred_after, filter.occurred_before) {
            if from > to {
                return Err(LedgerError::Validation(format!(
                    "history range is inverted: {from} is after {to}"
                )));
            }
        }
        Ok(self.store.history(filter, pagination).await?)
    }

    /// Records whose on-hand quantity is at or below `threshold`.
    pub async fn low_stock(&self, threshold: i64) -> Result<Vec<StockRecord>, LedgerError> {
        Ok(self.store.list_below_threshold(threshold).await?)
    }

    /// Catalog of movement types with display name, description and impact.
    pub fn movement_types(&self) -> Vec<MovementTypeInfo> {
        MovementType::catalog()
    }
}
