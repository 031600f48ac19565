use log::trace;
use harvest_common::overrides::OverrideRecord;

use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Append-only log of administrative overrides
pub trait OverrideProvider {
    fn add_override(&mut self, record: &OverrideRecord) -> Result<(), LedgerError>;

    /// Every override, oldest first
    fn get_overrides(&self) -> Result<Vec<OverrideRecord>, LedgerError>;
}

impl<S: Storage> OverrideProvider for StorageTransaction<'_, S> {
    fn add_override(&mut self, record: &OverrideRecord) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("add override {} by {}", record.id, record.actor);
        }
        self.insert_into_disk(Column::Overrides, &record.id.to_bytes(), record)
    }

    fn get_overrides(&self) -> Result<Vec<OverrideRecord>, LedgerError> {
        self.scan_values(Column::Overrides, &[])
    }
}
