//! Ledger audit: replays each key's transaction log and compares the result
//! with the stored snapshot.
//!
//! Administrative `upsert`s bypass the log, so keys touched that way are
//! expected to show up here.

use serde::Serialize;
use tracing::{info, instrument, warn};

use stockledger_inventory::{StockKey, StockRecord};

use crate::error::LedgerError;
use crate::store::{StockRecordStore, TransactionLog};

/// Snapshot quantities that disagree with the replayed log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub key: StockKey,
    pub snapshot_on_hand: i64,
    pub snapshot_reserved: i64,
    pub replayed_on_hand: i64,
    pub replayed_reserved: i64,
    pub entries: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub checked: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LedgerAuditor<S> {
    store: S,
}

impl<S> LedgerAuditor<S>
where
    S: StockRecordStore + TransactionLog,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `None` when the snapshot (or its absence) matches the log.
    pub async fn verify_key(&self, key: StockKey) -> Result<Option<Discrepancy>, LedgerError> {
        let entries = self.store.entries_for_key(key).await?;
        let snapshot = self
            .store
            .get(key)
            .await?
            .unwrap_or_else(|| StockRecord::empty(key));
        let replayed = StockRecord::from_log(key, &entries);

        if snapshot.on_hand() == replayed.on_hand() && snapshot.reserved() == replayed.reserved() {
            return Ok(None);
        }

        Ok(Some(Discrepancy {
            key,
            snapshot_on_hand: snapshot.on_hand(),
            snapshot_reserved: snapshot.reserved(),
            replayed_on_hand: replayed.on_hand(),
            replayed_reserved: replayed.reserved(),
            entries: entries.len(),
        }))
    }

    #[instrument(skip(self), fields(checked, discrepancies))]
    pub async fn verify_all(&self) -> Result<AuditReport, LedgerError> {
        let records = self.store.list_all().await?;
        let mut report = AuditReport::default();

        for record in records {
            report.checked += 1;
            if let Some(discrepancy) = self.verify_key(record.key()).await? {
                warn!(
                    key = %discrepancy.key,
                    snapshot_on_hand = discrepancy.snapshot_on_hand,
                    replayed_on_hand = discrepancy.replayed_on_hand,
                    snapshot_reserved = discrepancy.snapshot_reserved,
                    replayed_reserved = discrepancy.replayed_reserved,
                    "snapshot diverges from transaction log"
                );
                report.discrepancies.push(discrepancy);
            }
        }

        let span = tracing::Span::current();
        span.record("checked", report.checked);
        span.record("discrepancies", report.discrepancies.len());
        info!(checked = report.checked, discrepancies = report.discrepancies.len(), "ledger audit finished");
        Ok(report)
    }
}
