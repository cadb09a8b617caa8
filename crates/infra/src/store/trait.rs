use std::sync::Arc;

use thiserror::Error;

use stockledger_core::{ExpectedVersion, ProductId, WarehouseId};
use stockledger_inventory::{NewLogEntry, StockKey, StockRecord, TransactionLogEntry};

use super::query::{HistoryFilter, Page, Pagination};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to business rejections, which
/// never reach the store.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    /// The stored version moved underneath the caller, or the backend reported
    /// a serialization failure / lock timeout. Safe to retry from a fresh read.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerStoreError {
    pub fn is_concurrency(&self) -> bool {
        matches!(self, LedgerStoreError::Concurrency(_))
    }
}

/// Durable keyed storage of one snapshot per (product, warehouse).
///
/// No invariant enforcement happens here. Records that were never committed
/// (version 0) are not visible to reads.
#[async_trait::async_trait]
pub trait StockRecordStore: Send + Sync {
    async fn get(&self, key: StockKey) -> Result<Option<StockRecord>, LedgerStoreError>;

    /// Administrative overwrite of a snapshot. Bypasses the transaction log and
    /// bumps the stored version, so in-flight movements on the key conflict.
    async fn upsert(&self, record: StockRecord) -> Result<StockRecord, LedgerStoreError>;

    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, LedgerStoreError>;

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        pagination: Pagination,
    ) -> Result<Page<StockRecord>, LedgerStoreError>;

    /// Records with `on_hand <= threshold`.
    async fn list_below_threshold(&self, threshold: i64) -> Result<Vec<StockRecord>, LedgerStoreError>;

    async fn list_all(&self) -> Result<Vec<StockRecord>, LedgerStoreError>;
}

/// Append-only log of accepted movements.
#[async_trait::async_trait]
pub trait TransactionLog: Send + Sync {
    /// Filtered history, newest first (`created_at DESC, id DESC`).
    async fn history(
        &self,
        filter: HistoryFilter,
        pagination: Pagination,
    ) -> Result<Page<TransactionLogEntry>, LedgerStoreError>;

    /// Every entry for one key in id order (replay order).
    async fn entries_for_key(&self, key: StockKey) -> Result<Vec<TransactionLogEntry>, LedgerStoreError>;
}

/// Snapshot store and transaction log sharing one atomic write path.
///
/// `commit` persists `record` and appends `entry` as a single all-or-nothing
/// unit, and only when the stored version still equals `expected`. The stored
/// record's version becomes `record.version()`.
#[async_trait::async_trait]
pub trait LedgerStore: StockRecordStore + TransactionLog {
    async fn commit(
        &self,
        record: &StockRecord,
        expected: ExpectedVersion,
        entry: NewLogEntry,
    ) -> Result<TransactionLogEntry, LedgerStoreError>;
}

#[async_trait::async_trait]
impl<S> StockRecordStore for Arc<S>
where
    S: StockRecordStore + ?Sized,
{
    async fn get(&self, key: StockKey) -> Result<Option<StockRecord>, LedgerStoreError> {
        (**self).get(key).await
    }

    async fn upsert(&self, record: StockRecord) -> Result<StockRecord, LedgerStoreError> {
        (**self).upsert(record).await
    }

    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, LedgerStoreError> {
        (**self).list_by_product(product_id).await
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        pagination: Pagination,
    ) -> Result<Page<StockRecord>, LedgerStoreError> {
        (**self).list_by_warehouse(warehouse_id, pagination).await
    }

    async fn list_below_threshold(&self, threshold: i64) -> Result<Vec<StockRecord>, LedgerStoreError> {
        (**self).list_below_threshold(threshold).await
    }

    async fn list_all(&self) -> Result<Vec<StockRecord>, LedgerStoreError> {
        (**self).list_all().await
    }
}

#[async_trait::async_trait]
impl<S> TransactionLog for Arc<S>
where
    S: TransactionLog + ?Sized,
{
    async fn history(
        &self,
        filter: HistoryFilter,
        pagination: Pagination,
    ) -> Result<Page<TransactionLogEntry>, LedgerStoreError> {
        (**self).history(filter, pagination).await
    }

    async fn entries_for_key(&self, key: StockKey) -> Result<Vec<TransactionLogEntry>, LedgerStoreError> {
        (**self).entries_for_key(key).await
    }
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn commit(
        &self,
        record: &StockRecord,
        expected: ExpectedVersion,
        entry: NewLogEntry,
    ) -> Result<TransactionLogEntry, LedgerStoreError> {
        (**self).commit(record, expected, entry).await
    }
}
