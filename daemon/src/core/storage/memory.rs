use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock,
    },
};

use bytes::Bytes;
use log::trace;

use super::{Column, Snapshot, Storage, Version};
use crate::core::error::LedgerError;

type Tree = BTreeMap<Bytes, (Version, Bytes)>;

#[derive(Default)]
struct Inner {
    columns: HashMap<Column, Tree>,
    // last commit sequence, used as version of the keys it wrote
    sequence: Version,
}

impl Inner {
    fn version_of(&self, column: &Column, key: &[u8]) -> Version {
        self.columns
            .get(column)
            .and_then(|tree| tree.get(key))
            .map_or(0, |(version, _)| *version)
    }
}

/// In-process backend, used for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
    ids: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_versioned(
        &self,
        column: Column,
        key: &[u8],
    ) -> Result<Option<(Version, Bytes)>, LedgerError> {
        let inner = self.inner.read().map_err(|_| LedgerError::PoisonedLock)?;
        Ok(inner
            .columns
            .get(&column)
            .and_then(|tree| tree.get(key))
            .cloned())
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<Vec<(Bytes, Bytes)>, LedgerError> {
        let inner = self.inner.read().map_err(|_| LedgerError::PoisonedLock)?;
        let Some(tree) = inner.columns.get(&column) else {
            return Ok(Vec::new());
        };

        Ok(tree
            .range(Bytes::copy_from_slice(prefix)..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (_, value))| (key.clone(), value.clone()))
            .collect())
    }

    fn next_id(&self) -> Result<u64, LedgerError> {
        Ok(self.ids.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn commit(&self, snapshot: Snapshot<Column>) -> Result<Version, LedgerError> {
        let (trees, reads) = snapshot.into_parts();
        let mut inner = self.inner.write().map_err(|_| LedgerError::PoisonedLock)?;

        for (column, keys) in reads.iter() {
            for (key, version) in keys.iter() {
                if inner.version_of(column, key) != *version {
                    if log::log_enabled!(log::Level::Trace) {
                        trace!("conflict on {} key {:?}", column, key);
                    }
                    return Err(LedgerError::ConcurrencyConflict);
                }
            }
        }

        if trees.values().all(|changes| changes.is_empty()) {
            return Ok(inner.sequence);
        }

        inner.sequence += 1;
        let version = inner.sequence;
        for (column, changes) in trees {
            let tree = inner.columns.entry(column).or_default();
            for (key, value) in changes {
                match value {
                    Some(value) => {
                        tree.insert(key, (version, value));
                    }
                    None => {
                        tree.remove(&key);
                    }
                }
            }
        }

        Ok(version)
    }

    fn flush(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(storage: &MemoryStorage, key: &'static [u8], value: &'static [u8]) -> Version {
        let mut snapshot = Snapshot::new();
        snapshot.put(Column::Accounts, key, value);
        storage.commit(snapshot).unwrap()
    }

    #[test]
    fn test_commit_and_read() {
        let storage = MemoryStorage::new();
        let version = write(&storage, b"a", b"1");
        assert_eq!(
            storage.get_versioned(Column::Accounts, b"a").unwrap(),
            Some((version, Bytes::from_static(b"1")))
        );
        assert_eq!(storage.get_versioned(Column::Products, b"a").unwrap(), None);
    }

    #[test]
    fn test_stale_read_conflicts() {
        let storage = MemoryStorage::new();
        let version = write(&storage, b"a", b"1");

        let mut stale = Snapshot::new();
        stale.record_read(Column::Accounts, b"a", version);
        stale.put(Column::Accounts, &b"a"[..], &b"stale"[..]);

        // someone else commits in between
        write(&storage, b"a", b"2");

        assert!(matches!(
            storage.commit(stale),
            Err(LedgerError::ConcurrencyConflict)
        ));
        assert_eq!(
            storage.get_versioned(Column::Accounts, b"a").unwrap().map(|(_, v)| v),
            Some(Bytes::from_static(b"2"))
        );
    }

    #[test]
    fn test_absent_read_conflicts_with_insert() {
        let storage = MemoryStorage::new();
        let mut snapshot = Snapshot::new();
        snapshot.record_read(Column::PurchaseCounts, b"k", 0);
        snapshot.put(Column::PurchaseCounts, &b"k"[..], &b"1"[..]);

        let mut other = Snapshot::new();
        other.put(Column::PurchaseCounts, &b"k"[..], &b"1"[..]);
        storage.commit(other).unwrap();

        assert!(storage.commit(snapshot).is_err());
    }

    #[test]
    fn test_scan_prefix_and_ids() {
        let storage = MemoryStorage::new();
        write(&storage, b"ab", b"1");
        write(&storage, b"ac", b"2");
        write(&storage, b"b", b"3");

        let entries = storage.scan_prefix(Column::Accounts, b"a").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, Bytes::from_static(b"ac"));

        assert_eq!(storage.next_id().unwrap(), 1);
        assert_eq!(storage.next_id().unwrap(), 2);
    }
}
