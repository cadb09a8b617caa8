use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use stockledger_core::{AggregateRoot, ExpectedVersion, ProductId, WarehouseId};
use stockledger_inventory::{NewLogEntry, StockKey, StockRecord, TransactionId, TransactionLogEntry};

use super::query::{HistoryFilter, Page, Pagination};
use super::r#trait::{LedgerStore, LedgerStoreError, StockRecordStore, TransactionLog};

/// Everything stored for one key: the snapshot and that key's log entries.
#[derive(Debug, Default)]
struct Slot {
    record: Option<StockRecord>,
    entries: Vec<TransactionLogEntry>,
}

impl Slot {
    fn current_version(&self) -> u64 {
        self.record.as_ref().map(|r| r.version()).unwrap_or(0)
    }

    fn visible(&self) -> Option<&StockRecord> {
        self.record.as_ref().filter(|r| r.is_persisted())
    }
}

/// In-memory ledger store.
///
/// Each key owns a slot behind its own mutex, so movements on different keys
/// never wait on each other. The key map is only write-locked to add a slot.
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    slots: RwLock<HashMap<StockKey, Arc<Mutex<Slot>>>>,
    next_id: AtomicU64,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: StockKey) -> Result<Option<Arc<Mutex<Slot>>>, LedgerStoreError> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.get(&key).cloned())
    }

    fn slot_or_insert(&self, key: StockKey) -> Result<Arc<Mutex<Slot>>, LedgerStoreError> {
        if let Some(slot) = self.slot(key)? {
            return Ok(slot);
        }
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        Ok(slots.entry(key).or_default().clone())
    }

    fn all_slots(&self) -> Result<Vec<Arc<Mutex<Slot>>>, LedgerStoreError> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.values().cloned().collect())
    }

    /// Visible records matching `pred`, ordered by key.
    fn collect_records(
        &self,
        pred: impl Fn(&StockRecord) -> bool,
    ) -> Result<Vec<StockRecord>, LedgerStoreError> {
        let mut out = Vec::new();
        for slot in self.all_slots()? {
            let slot = slot.lock().map_err(|_| poisoned())?;
            if let Some(record) = slot.visible().filter(|r| pred(r)) {
                out.push(record.clone());
            }
        }
        out.sort_by_key(|r| r.key());
        Ok(out)
    }
}

fn poisoned() -> LedgerStoreError {
    LedgerStoreError::Storage("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl StockRecordStore for InMemoryLedgerStore {
    async fn get(&self, key: StockKey) -> Result<Option<StockRecord>, LedgerStoreError> {
        let Some(slot) = self.slot(key)? else {
            return Ok(None);
        };
        let slot = slot.lock().map_err(|_| poisoned())?;
        Ok(slot.visible().cloned())
    }

    async fn upsert(&self, record: StockRecord) -> Result<StockRecord, LedgerStoreError> {
        let slot = self.slot_or_insert(record.key())?;
        let mut slot = slot.lock().map_err(|_| poisoned())?;
        let stored = record.with_version(slot.current_version() + 1);
        slot.record = Some(stored.clone());
        Ok(stored)
    }

    async fn list_by_product(&self, product_id: ProductId) -> Result<Vec<StockRecord>, LedgerStoreError> {
        self.collect_records(|r| r.product_id() == product_id)
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        pagination: Pagination,
    ) -> Result<Page<StockRecord>, LedgerStoreError> {
        let records = self.collect_records(|r| r.warehouse_id() == warehouse_id)?;
        Ok(pagination.apply(records))
    }

    async fn list_below_threshold(&self, threshold: i64) -> Result<Vec<StockRecord>, LedgerStoreError> {
        self.collect_records(|r| r.on_hand() <= threshold)
    }

    async fn list_all(&self) -> Result<Vec<StockRecord>, LedgerStoreError> {
        self.collect_records(|_| true)
    }
}

#[async_trait::async_trait]
impl TransactionLog for InMemoryLedgerStore {
    async fn history(
        &self,
        filter: HistoryFilter,
        pagination: Pagination,
    ) -> Result<Page<TransactionLogEntry>, LedgerStoreError> {
        let mut matched = Vec::new();
        for slot in self.all_slots()? {
            let slot = slot.lock().map_err(|_| poisoned())?;
            matched.extend(slot.entries.iter().filter(|e| filter.matches(e)).cloned());
        }
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(pagination.apply(matched))
    }

    async fn entries_for_key(&self, key: StockKey) -> Result<Vec<TransactionLogEntry>, LedgerStoreError> {
        let Some(slot) = self.slot(key)? else {
            return Ok(Vec::new());
        };
        let slot = slot.lock().map_err(|_| poisoned())?;
        Ok(slot.entries.clone())
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn commit(
        &self,
        record: &StockRecord,
        expected: ExpectedVersion,
        entry: NewLogEntry,
    ) -> Result<TransactionLogEntry, LedgerStoreError> {
        if entry.key != record.key() {
            return Err(LedgerStoreError::Storage(format!(
                "log entry for {} does not match record {}",
                entry.key,
                record.key()
            )));
        }

        let slot = self.slot_or_insert(record.key())?;
        let mut slot = slot.lock().map_err(|_| poisoned())?;

        expected
            .check(slot.current_version())
            .map_err(|e| LedgerStoreError::Concurrency(e.to_string()))?;

        // Ids are drawn under the slot lock so per-key order equals id order.
        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let created_at = entry.created_at;
        let committed = entry.commit(id, created_at);

        slot.record = Some(record.clone());
        slot.entries.push(committed.clone());
        Ok(committed)
    }
}
