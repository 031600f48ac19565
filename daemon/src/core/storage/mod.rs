mod column;
mod memory;
mod providers;
mod sled;
mod transaction;

pub mod snapshot;

use bytes::Bytes;

use crate::core::error::LedgerError;

pub use self::{
    column::Column,
    memory::MemoryStorage,
    providers::*,
    sled::SledStorage,
    snapshot::{Changes, EntryState, Snapshot},
    transaction::StorageTransaction,
};

/// Version of a stored entry.
/// It is the commit sequence that last wrote the key, 0 means absent.
pub type Version = u64;

/// A storage backend with optimistic transactions.
///
/// Reads go directly to the backend and record the version they observed,
/// writes are buffered in a `Snapshot` and applied by `commit`.
/// Prefix scans are not part of the read set: every atomic unit that
/// depends on a scan also reads a record that any conflicting writer updates.
pub trait Storage: Send + Sync + 'static {
    /// Read a raw value with the version that wrote it
    fn get_versioned(&self, column: Column, key: &[u8])
        -> Result<Option<(Version, Bytes)>, LedgerError>;

    /// All entries of a column whose key starts with `prefix`, in key order
    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>, LedgerError>;

    /// Allocate a new unique identifier, never returns 0
    fn next_id(&self) -> Result<u64, LedgerError>;

    /// Validate the read set of the snapshot and apply its writes atomically.
    /// Returns the commit sequence, fails with `ConcurrencyConflict`
    /// if any key read by the snapshot changed since it was read.
    fn commit(&self, snapshot: Snapshot<Column>) -> Result<Version, LedgerError>;

    /// Persist pending writes to disk
    fn flush(&self) -> Result<(), LedgerError>;

    /// Name used in logs
    fn backend_name(&self) -> &'static str;
}
