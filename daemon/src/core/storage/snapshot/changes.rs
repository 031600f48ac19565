use std::collections::{btree_map::IntoIter, BTreeMap};

use bytes::Bytes;

use super::EntryState;

/// Pending writes of one column.
/// A `None` value is a tombstone hiding the entry stored on disk.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    pub writes: BTreeMap<Bytes, Option<Bytes>>,
}

impl Changes {
    /// Set a key, returns what the batch held for it before
    pub fn insert<K, V>(&mut self, key: K, value: V) -> EntryState<Bytes>
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        EntryState::from_write(self.writes.insert(key.into(), Some(value.into())))
    }

    /// Record a tombstone, returns what the batch held for it before
    pub fn remove<K>(&mut self, key: K) -> EntryState<Bytes>
    where
        K: Into<Bytes>,
    {
        EntryState::from_write(self.writes.insert(key.into(), None))
    }

    /// State of a key in this batch only
    pub fn get(&self, key: &[u8]) -> EntryState<&Bytes> {
        match self.writes.get(key) {
            Some(Some(value)) => EntryState::Stored(value),
            Some(None) => EntryState::Deleted,
            None => EntryState::Absent,
        }
    }

    /// Writes whose key starts with `prefix`, in key order
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a Bytes, &'a Option<Bytes>)> + 'a {
        self.writes
            .range(Bytes::copy_from_slice(prefix)..)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

impl IntoIterator for Changes {
    type Item = (Bytes, Option<Bytes>);
    type IntoIter = IntoIter<Bytes, Option<Bytes>>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
