//! Movement processor: the single write path into the ledger.
//!
//! Each movement is decided by the `StockRecord` aggregate against a fresh
//! read, then committed with an exact expected version. A lost race is retried
//! from a fresh read under the configured `RetryPolicy`.

use chrono::Utc;
use tracing::{Span, debug, info, instrument, warn};

use stockledger_core::{Aggregate, ExpectedVersion};
use stockledger_inventory::{ApplyMovement, MovementRequest, NewLogEntry, StockRecord, TransactionLogEntry};

use crate::config::LedgerConfig;
use crate::error::{BatchFailure, LedgerError};
use crate::reservation::Reservations;
use crate::retry::RetryPolicy;
use crate::store::{LedgerStore, LedgerStoreError};

#[derive(Debug, Clone)]
pub struct MovementProcessor<S> {
    store: S,
    retry: RetryPolicy,
}

/// Outcome of one load-decide-commit pass.
enum Attempt {
    Committed(TransactionLogEntry),
    Conflict(String),
}

impl<S> MovementProcessor<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Processor using the retry budget from `config`.
    pub fn from_config(store: S, config: &LedgerConfig) -> Self {
        Self::new(store).with_retry_policy(config.retry.clone())
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn reservations(&self) -> Reservations<'_, S> {
        Reservations::new(self)
    }

    /// Apply one movement atomically and return its log entry.
    ///
    /// Rejections (`Validation`, insufficient stock) change nothing. Exhausting
    /// the retry budget yields `ConcurrencyConflict`, which the caller may retry.
    #[instrument(
        skip(self, cmd),
        fields(
            product_id = %cmd.key.product_id,
            warehouse_id = %cmd.key.warehouse_id,
            movement_type = %cmd.movement_type,
            quantity = cmd.quantity,
            operator = %cmd.operator,
            attempts
        )
    )]
    pub async fn apply_movement(&self, cmd: ApplyMovement) -> Result<TransactionLogEntry, LedgerError> {
        if let Err(err) = cmd.validate() {
            debug!(error = %err, "movement rejected");
            return Err(err.into());
        }

        let mut retries = 0;
        loop {
            match self.attempt(&cmd).await {
                Ok(Attempt::Committed(entry)) => {
                    Span::current().record("attempts", retries + 1);
                    info!(transaction_id = %entry.id, "movement applied");
                    return Ok(entry);
                }
                Ok(Attempt::Conflict(message)) => {
                    if !self.retry.should_retry(retries) {
                        Span::current().record("attempts", retries + 1);
                        warn!(%message, "movement conflicted; retry budget exhausted");
                        return Err(LedgerError::ConcurrencyConflict {
                            attempts: retries + 1,
                            message,
                        });
                    }
                    retries += 1;
                    let delay = self.retry.delay_for_retry(retries);
                    warn!(retry = retries, delay_ms = delay.as_millis() as u64, %message, "movement conflicted; retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    if err.is_insufficient_stock() || matches!(err, LedgerError::Validation(_)) {
                        info!(error = %err, "movement rejected");
                    } else {
                        warn!(error = %err, "movement failed");
                    }
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, cmd: &ApplyMovement) -> Result<Attempt, LedgerError> {
        let current = match self.store.get(cmd.key).await {
            Ok(found) => found.unwrap_or_else(|| StockRecord::empty(cmd.key)),
            Err(LedgerStoreError::Concurrency(message)) => return Ok(Attempt::Conflict(message)),
            Err(err) => return Err(err.into()),
        };

        let stamped = cmd.clone().at(Utc::now());
        let event = current.handle(&stamped)?;

        let expected = ExpectedVersion::of(&current);
        let mut next = current;
        next.apply(&event);

        match self.store.commit(&next, expected, NewLogEntry::from(&event)).await {
            Ok(entry) => Ok(Attempt::Committed(entry)),
            Err(LedgerStoreError::Concurrency(message)) => Ok(Attempt::Conflict(message)),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply `requests` in order under one operator.
    ///
    /// Every request is validated before anything is applied. Application then
    /// stops at the first failure; movements committed before it stay committed
    /// and are reported in the `BatchFailure`.
    #[instrument(skip(self, requests, operator), fields(batch_size = requests.len(), operator = %operator))]
    pub async fn apply_batch(
        &self,
        requests: Vec<MovementRequest>,
        operator: &str,
    ) -> Result<Vec<TransactionLogEntry>, BatchFailure> {
        let commands: Vec<ApplyMovement> = requests
            .into_iter()
            .map(|request| request.into_command(operator))
            .collect();

        for (index, cmd) in commands.iter().enumerate() {
            if let Err(err) = cmd.validate() {
                info!(index, error = %err, "batch rejected during validation");
                return Err(BatchFailure {
                    index,
                    applied: Vec::new(),
                    error: err.into(),
                });
            }
        }

        let mut applied = Vec::with_capacity(commands.len());
        for (index, cmd) in commands.into_iter().enumerate() {
            match self.apply_movement(cmd).await {
                Ok(entry) => applied.push(entry),
                Err(error) => {
                    warn!(index, applied = applied.len(), error = %error, "batch stopped");
                    return Err(BatchFailure { index, applied, error });
                }
            }
        }

        info!(applied = applied.len(), "batch applied");
        Ok(applied)
    }
}
