use std::path::Path;

use bytes::Bytes;
use log::{debug, info, trace};
use ::sled::{
    transaction::{ConflictableTransactionError, TransactionError},
    Db, IVec, Tree,
};

use super::{Column, Snapshot, Storage, Version};
use crate::core::error::LedgerError;

const LEDGER_TREE: &str = "ledger";
// Outside of every column prefix
const COMMIT_SEQUENCE_KEY: &[u8] = b"\xffcommit_sequence";

const VERSION_SIZE: usize = 8;

/// Disk backend on a single sled tree.
///
/// Keys are `{column prefix}{key}`, values are `{version}{data}`.
/// Every commit bumps a shared sequence key, so sled serializes
/// the validation and the writes of concurrent commits.
pub struct SledStorage {
    db: Db,
    tree: Tree,
}

fn column_key(column: Column, key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(1 + key.len());
    full.push(column.prefix());
    full.extend_from_slice(key);
    full
}

fn decode_value(raw: &IVec) -> Result<(Version, Bytes), LedgerError> {
    if raw.len() < VERSION_SIZE {
        return Err(LedgerError::CorruptedData("version header"));
    }
    let (version, data) = raw.split_at(VERSION_SIZE);
    let version = u64::from_be_bytes(
        version
            .try_into()
            .map_err(|_| LedgerError::CorruptedData("version header"))?,
    );
    Ok((version, Bytes::copy_from_slice(data)))
}

fn version_of(raw: Option<IVec>) -> Version {
    raw.and_then(|raw| raw.get(..VERSION_SIZE).and_then(|v| v.try_into().ok()))
        .map_or(0, u64::from_be_bytes)
}

fn encode_value(version: Version, data: &[u8]) -> Vec<u8> {
    let mut value = Vec::with_capacity(VERSION_SIZE + data.len());
    value.extend_from_slice(&version.to_be_bytes());
    value.extend_from_slice(data);
    value
}

impl SledStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, LedgerError> {
        let db = ::sled::open(dir.as_ref())?;
        let tree = db.open_tree(LEDGER_TREE)?;
        if log::log_enabled!(log::Level::Info) {
            info!(
                "Opened sled storage at {} ({} entries)",
                dir.as_ref().display(),
                tree.len()
            );
        }
        Ok(Self { db, tree })
    }

    /// Temporary database removed on drop, used by tests
    pub fn temporary() -> Result<Self, LedgerError> {
        let db = ::sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(LEDGER_TREE)?;
        Ok(Self { db, tree })
    }
}

impl Storage for SledStorage {
    fn get_versioned(
        &self,
        column: Column,
        key: &[u8],
    ) -> Result<Option<(Version, Bytes)>, LedgerError> {
        self.tree
            .get(column_key(column, key))?
            .map(|raw| decode_value(&raw))
            .transpose()
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>, LedgerError> {
        let mut entries = Vec::new();
        for res in self.tree.scan_prefix(column_key(column, prefix)) {
            let (key, raw) = res?;
            let (_, value) = decode_value(&raw)?;
            entries.push((Bytes::copy_from_slice(&key[1..]), value));
        }
        Ok(entries)
    }

    fn next_id(&self) -> Result<u64, LedgerError> {
        // sled starts at 0
        Ok(self.db.generate_id()? + 1)
    }

    fn commit(&self, snapshot: Snapshot<Column>) -> Result<Version, LedgerError> {
        let (trees, reads) = snapshot.into_parts();
        let has_writes = trees.values().any(|changes| !changes.is_empty());

        let result = self.tree.transaction(|tx| {
            for (column, keys) in reads.iter() {
                for (key, version) in keys.iter() {
                    let current = version_of(tx.get(column_key(*column, key))?);
                    if current != *version {
                        return Err(ConflictableTransactionError::Abort(
                            LedgerError::ConcurrencyConflict,
                        ));
                    }
                }
            }

            let sequence = version_of(tx.get(COMMIT_SEQUENCE_KEY)?);
            if !has_writes {
                return Ok(sequence);
            }

            let sequence = sequence + 1;
            tx.insert(COMMIT_SEQUENCE_KEY, encode_value(sequence, &[]))?;
            for (column, changes) in trees.iter() {
                for (key, value) in changes.writes.iter() {
                    let full_key = column_key(*column, key);
                    match value {
                        Some(value) => {
                            tx.insert(full_key, encode_value(sequence, value))?;
                        }
                        None => {
                            tx.remove(full_key)?;
                        }
                    }
                }
            }

            Ok(sequence)
        });

        match result {
            Ok(sequence) => {
                if log::log_enabled!(log::Level::Trace) {
                    trace!("sled commit {} applied", sequence);
                }
                Ok(sequence)
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(e.into()),
        }
    }

    fn flush(&self) -> Result<(), LedgerError> {
        let bytes = self.db.flush()?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("sled flushed {} bytes", bytes);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
