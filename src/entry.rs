use std::collections::hash_map::{
    Entry as StdEntry, OccupiedEntry as StdOccupiedEntry, VacantEntry as StdVacantEntry,
};
use std::hash::Hash;
use std::mem;

use crate::Slot;
use crate::order_cache::OrderCache;

/// A view into a single key of a [`SortedDict`](crate::SortedDict), obtained from
/// [`SortedDict::entry`](crate::SortedDict::entry).
pub enum Entry<'a, K, V> {
    Occupied(OccupiedEntry<'a, K, V>),
    Vacant(VacantEntry<'a, K, V>),
}

pub struct OccupiedEntry<'a, K, V> {
    entry: StdOccupiedEntry<'a, K, Slot<V>>,
    cache: &'a mut OrderCache<K>,
}

pub struct VacantEntry<'a, K, V> {
    entry: StdVacantEntry<'a, K, Slot<V>>,
    cache: &'a mut OrderCache<K>,
    next_seq: &'a mut u64,
}

impl<'a, K, V> Entry<'a, K, V> {
    pub(crate) fn new(
        entry: StdEntry<'a, K, Slot<V>>,
        cache: &'a mut OrderCache<K>,
        next_seq: &'a mut u64,
    ) -> Self {
        match entry {
            StdEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry, cache }),
            StdEntry::Vacant(entry) => Entry::Vacant(VacantEntry {
                entry,
                cache,
                next_seq,
            }),
        }
    }

    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(occ) => occ.key(),
            Entry::Vacant(vac) => vac.key(),
        }
    }

    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(|| default)
    }

    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(occ) => occ.into_mut(),
            Entry::Vacant(vac) => vac.insert(default()),
        }
    }

    pub fn or_insert_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Modifies the value in place if the key is present. Never touches the key order.
    #[must_use]
    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(occ) = &mut self {
            f(occ.get_mut());
        }
        self
    }
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    pub fn key(&self) -> &K {
        self.entry.key()
    }

    pub fn get(&self) -> &V {
        &self.entry.get().value
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().value
    }

    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().value
    }

    /// Overwrites the value, returning the old one. The key keeps its position.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }
}

impl<K: Eq + Hash, V> OccupiedEntry<'_, K, V> {
    pub fn remove_entry(self) -> (K, V) {
        let Self { entry, cache } = self;
        cache.remove(entry.key());
        let (k, slot) = entry.remove_entry();
        (k, slot.value)
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    pub fn key(&self) -> &K {
        self.entry.key()
    }

    pub fn into_key(self) -> K {
        self.entry.into_key()
    }

    /// Inserts a new key. The key order is recomputed on the next ordered read.
    pub fn insert(self, value: V) -> &'a mut V {
        let Self {
            entry,
            cache,
            next_seq,
        } = self;
        cache.invalidate();
        let seq = *next_seq;
        *next_seq += 1;
        &mut entry.insert(Slot { value, seq }).value
    }
}
