mod changes;

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

use bytes::Bytes;
use itertools::{EitherOrBoth, Itertools};

pub use changes::Changes;

use super::Version;

/// State of an entry in the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState<T> {
    /// The entry was written by this snapshot
    Stored(T),
    /// The entry was deleted by this snapshot
    Deleted,
    /// The snapshot never touched the entry, fallback on disk
    Absent,
}

impl<T> EntryState<T> {
    fn from_write(previous: Option<Option<T>>) -> Self {
        match previous {
            Some(Some(value)) => EntryState::Stored(value),
            Some(None) => EntryState::Deleted,
            None => EntryState::Absent,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, EntryState::Stored(_))
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, EntryState::Deleted)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, EntryState::Absent)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> EntryState<U> {
        match self {
            EntryState::Stored(v) => EntryState::Stored(f(v)),
            EntryState::Deleted => EntryState::Deleted,
            EntryState::Absent => EntryState::Absent,
        }
    }

    pub fn stored(self) -> Option<T> {
        match self {
            EntryState::Stored(v) => Some(v),
            _ => None,
        }
    }
}

/// Buffered writes of one atomic unit, together with the versions of
/// every key it read from disk.
///
/// Nothing reaches the backend until the snapshot is committed, dropping it
/// discards the whole unit.
#[derive(Debug)]
pub struct Snapshot<C: Hash + Eq> {
    /// Pending changes organized by column
    pub trees: HashMap<C, Changes>,
    /// Version observed for each key read from disk, 0 when it was absent
    pub reads: HashMap<C, BTreeMap<Bytes, Version>>,
}

impl<C: Hash + Eq> Default for Snapshot<C> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
            reads: HashMap::new(),
        }
    }
}

impl<C: Hash + Eq> Snapshot<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the snapshot and return the writes and the read set
    pub fn into_parts(self) -> (HashMap<C, Changes>, HashMap<C, BTreeMap<Bytes, Version>>) {
        (self.trees, self.reads)
    }

    /// True when the snapshot has nothing to write
    pub fn has_no_writes(&self) -> bool {
        self.trees.values().all(Changes::is_empty)
    }

    pub fn put<K: Into<Bytes>, V: Into<Bytes>>(&mut self, column: C, key: K, value: V) -> EntryState<Bytes> {
        self.trees.entry(column).or_default().insert(key, value)
    }

    pub fn delete<K: Into<Bytes>>(&mut self, column: C, key: K) -> EntryState<Bytes> {
        self.trees.entry(column).or_default().remove(key)
    }

    /// State of a key in this snapshot, `Absent` means it must be read from disk
    pub fn get<'a>(&'a self, column: &C, key: &[u8]) -> EntryState<&'a Bytes> {
        self.trees
            .get(column)
            .map_or(EntryState::Absent, |changes| changes.get(key))
    }

    /// Returns Some(true) if the key is stored by this snapshot,
    /// Some(false) if it was deleted, None if it must be read from disk
    pub fn contains_key(&self, column: &C, key: &[u8]) -> Option<bool> {
        match self.get(column, key) {
            EntryState::Stored(_) => Some(true),
            EntryState::Deleted => Some(false),
            EntryState::Absent => None,
        }
    }

    /// Remember the version of a key read from disk.
    /// Only the first read counts, a later read in the same unit sees the same state.
    pub fn record_read(&mut self, column: C, key: &[u8], version: Version) {
        self.reads
            .entry(column)
            .or_default()
            .entry(Bytes::copy_from_slice(key))
            .or_insert(version);
    }

    pub fn read_count(&self) -> usize {
        self.reads.values().map(BTreeMap::len).sum()
    }

    /// Merge entries scanned on disk with the pending writes of the same prefix.
    /// Both sides are sorted by key, the snapshot wins on equal keys
    /// and its tombstones hide the disk entries.
    pub fn merge_prefix(&self, column: &C, prefix: &[u8], disk: Vec<(Bytes, Bytes)>) -> Vec<(Bytes, Bytes)> {
        let Some(changes) = self.trees.get(column) else {
            return disk;
        };

        disk.into_iter()
            .merge_join_by(changes.with_prefix(prefix), |(disk_key, _), (key, _)| {
                disk_key.cmp(*key)
            })
            .filter_map(|entry| match entry {
                EitherOrBoth::Left(from_disk) => Some(from_disk),
                EitherOrBoth::Right((key, value)) | EitherOrBoth::Both(_, (key, value)) => {
                    value.as_ref().map(|value| (key.clone(), value.clone()))
                }
            })
            .collect()
    }
}
