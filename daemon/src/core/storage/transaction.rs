use bytes::Bytes;
use log::trace;
use serde::{de::DeserializeOwned, Serialize};

use super::{Column, EntryState, Snapshot, Storage};
use crate::core::error::LedgerError;

/// Reads and writes of one atomic unit.
///
/// Every read goes through the pending snapshot first and records the
/// version it observed on disk. The unit is applied by committing
/// the snapshot returned by `into_snapshot`.
pub struct StorageTransaction<'a, S: Storage> {
    storage: &'a S,
    snapshot: Snapshot<Column>,
}

impl<'a, S: Storage> StorageTransaction<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self {
            storage,
            snapshot: Snapshot::new(),
        }
    }

    pub fn into_snapshot(self) -> Snapshot<Column> {
        self.snapshot
    }

    pub fn next_id(&self) -> Result<u64, LedgerError> {
        self.storage.next_id()
    }

    fn load_raw(&mut self, column: Column, key: &[u8]) -> Result<Option<Bytes>, LedgerError> {
        match self.snapshot.get(&column, key) {
            EntryState::Stored(value) => return Ok(Some(value.clone())),
            EntryState::Deleted => return Ok(None),
            EntryState::Absent => {}
        }

        let entry = self.storage.get_versioned(column, key)?;
        let version = entry.as_ref().map_or(0, |(version, _)| *version);
        self.snapshot.record_read(column, key, version);
        Ok(entry.map(|(_, value)| value))
    }

    pub(super) fn load_optional_from_disk<V: DeserializeOwned>(
        &mut self,
        column: Column,
        key: &[u8],
    ) -> Result<Option<V>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("load {} key {:?}", column, key);
        }

        self.load_raw(column, key)?
            .map(|raw| bincode::deserialize(&raw))
            .transpose()
            .map_err(LedgerError::from)
    }

    pub(super) fn contains_data(&mut self, column: Column, key: &[u8]) -> Result<bool, LedgerError> {
        Ok(self.load_raw(column, key)?.is_some())
    }

    pub(super) fn insert_into_disk<V: Serialize>(
        &mut self,
        column: Column,
        key: &[u8],
        value: &V,
    ) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("insert {} key {:?}", column, key);
        }

        let raw = bincode::serialize(value)?;
        self.snapshot
            .put(column, Bytes::copy_from_slice(key), Bytes::from(raw));
        Ok(())
    }

    /// Index entries carry no value
    pub(super) fn insert_marker(&mut self, column: Column, key: &[u8]) {
        self.snapshot
            .put(column, Bytes::copy_from_slice(key), Bytes::new());
    }

    pub(super) fn remove_from_disk(&mut self, column: Column, key: &[u8]) {
        if log::log_enabled!(log::Level::Trace) {
            trace!("remove {} key {:?}", column, key);
        }
        self.snapshot.delete(column, Bytes::copy_from_slice(key));
    }

    /// Keys of a column starting with `prefix`, pending writes included
    pub(super) fn scan_keys(&self, column: Column, prefix: &[u8]) -> Result<Vec<Bytes>, LedgerError> {
        let disk = self.storage.scan_prefix(column, prefix)?;
        Ok(self
            .snapshot
            .merge_prefix(&column, prefix, disk)
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Decoded values of a column starting with `prefix`, pending writes included
    pub(super) fn scan_values<V: DeserializeOwned>(
        &self,
        column: Column,
        prefix: &[u8],
    ) -> Result<Vec<V>, LedgerError> {
        let disk = self.storage.scan_prefix(column, prefix)?;
        self.snapshot
            .merge_prefix(&column, prefix, disk)
            .into_iter()
            .map(|(_, raw)| bincode::deserialize(&raw).map_err(LedgerError::from))
            .collect()
    }
}
