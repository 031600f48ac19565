use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use harvest_common::{
    event::LedgerEvent,
    id::{AccountId, OverrideId},
    overrides::{OverrideKind, OverrideRecord},
    time::TimestampSeconds,
};
use tokio::time::sleep;

use super::{
    clock::{Clock, SystemClock},
    config::LedgerConfig,
    error::LedgerError,
    events::{AccountSubscription, EventBus},
    storage::{OverrideProvider, Storage, StorageTransaction},
};
use crate::config::ATOMIC_RETRY_BACKOFF_MS;

/// Value produced by an atomic unit with the events to publish once it is committed
pub struct Committed<T> {
    pub value: T,
    pub events: Vec<LedgerEvent>,
}

impl<T> Committed<T> {
    pub fn new(value: T, events: Vec<LedgerEvent>) -> Self {
        Self { value, events }
    }

    /// A unit that emits nothing
    pub fn silent(value: T) -> Self {
        Self::new(value, Vec::new())
    }
}

/// The ledger & accrual engine.
///
/// Every mutating operation is an atomic unit run by `execute`:
/// it reads the current state, decides, and writes, all or nothing.
pub struct Ledger<S: Storage> {
    storage: S,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl<S: Storage> Ledger<S> {
    pub fn new(storage: S, config: LedgerConfig) -> Result<Self, LedgerError> {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        config.validate()?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "Ledger ready on {} storage, commission levels {}, max {} attempts per unit",
                storage.backend_name(),
                config.commission_ratios.levels(),
                config.max_atomic_attempts
            );
        }

        let events = EventBus::new(config.event_channel_capacity);
        Ok(Self {
            storage,
            config,
            clock,
            events,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> TimestampSeconds {
        self.clock.now()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Events concerning one account
    pub fn subscribe(&self, account: AccountId) -> AccountSubscription {
        self.events.subscribe(account)
    }

    /// Run an atomic unit.
    ///
    /// The unit is a synchronous closure over a fresh transaction, it is run
    /// again with the same inputs when its commit conflicts with another unit,
    /// up to `max_atomic_attempts` times. A business error aborts the unit
    /// without writing anything.
    pub async fn execute<T, F>(&self, label: &'static str, unit: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: Fn(&mut StorageTransaction<'_, S>) -> Result<Committed<T>, LedgerError> + Send,
    {
        let attempts = self.config.max_atomic_attempts;
        for attempt in 1..=attempts {
            let outcome = {
                let mut tx = StorageTransaction::new(&self.storage);
                unit(&mut tx).and_then(|committed| {
                    self.storage.commit(tx.into_snapshot())?;
                    Ok(committed)
                })
            };

            match outcome {
                Ok(committed) => {
                    self.events.emit(committed.events);
                    return Ok(committed.value);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(_) => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!("'{}' conflicted on attempt {}/{}", label, attempt, attempts);
                    }
                }
            }

            if attempt < attempts {
                sleep(Duration::from_millis(ATOMIC_RETRY_BACKOFF_MS * attempt as u64)).await;
            }
        }

        warn!("'{}' gave up after {} attempts", label, attempts);
        Err(LedgerError::RetriesExhausted { label, attempts })
    }

    /// Run a read-only closure against the current state, nothing is committed
    pub fn read<T, F>(&self, reader: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut StorageTransaction<'_, S>) -> Result<T, LedgerError>,
    {
        let mut tx = StorageTransaction::new(&self.storage);
        reader(&mut tx)
    }

    /// Every administrative override, oldest first.
    /// With an account, only the overrides touching it.
    pub fn get_overrides(&self, account: Option<AccountId>) -> Result<Vec<OverrideRecord>, LedgerError> {
        let records = self.read(|tx| tx.get_overrides())?;
        Ok(match account {
            Some(account) => records
                .into_iter()
                .filter(|record| record.kind.account() == Some(account))
                .collect(),
            None => records,
        })
    }

    pub fn flush(&self) -> Result<(), LedgerError> {
        self.storage.flush()
    }
}

/// Fail unless an override names its actor and reason
pub(super) fn require_override_reason(actor: &str, reason: &str) -> Result<(), LedgerError> {
    if actor.trim().is_empty() || reason.trim().is_empty() {
        return Err(LedgerError::MissingOverrideReason);
    }
    Ok(())
}

/// Append an override to the log, in the same unit as its effect
pub(super) fn record_override<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    actor: &str,
    reason: &str,
    kind: OverrideKind,
    timestamp: TimestampSeconds,
) -> Result<OverrideRecord, LedgerError> {
    let record = OverrideRecord {
        id: OverrideId(tx.next_id()?),
        actor: actor.to_string(),
        reason: reason.to_string(),
        kind,
        timestamp,
    };
    tx.add_override(&record)?;
    Ok(record)
}
