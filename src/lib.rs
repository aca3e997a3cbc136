//! A hash map whose keys are presented in an order derived from a caller-supplied
//! ordering key function rather than from insertion order.
//!
//! ```
//! use sorted_dict::SortedDict;
//!
//! // Reverse alphabetical, case-insensitive.
//! let mut dict = SortedDict::new(|k: &&'static str| std::cmp::Reverse(k.to_lowercase()));
//! dict.insert("a", 0);
//! dict.insert("B", 1);
//! dict.insert("z", 10);
//!
//! assert_eq!(dict.keys().copied().collect::<Vec<_>>(), ["z", "B", "a"]);
//! assert_eq!(dict.index_of("B"), Ok(1));
//! ```
//!
//! For the common case of case-insensitive alphabetical text keys see [`AlphaSortedDict`].

mod alpha;
mod builder;
mod deep_clone;
mod entry;
mod error;
mod order_cache;
mod render;

pub use alpha::AlphaSortedDict;
pub use builder::SortedDictBuilder;
pub use deep_clone::{CloneMemo, DeepClone, Reconstruct};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::{Error, Result};
pub use order_cache::OrderKey;
pub use render::{DebugRender, RECURSION_MARKER, Render, RenderPath};

use derive_where::derive_where;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::ops::Index;
use std::slice;

use order_cache::OrderCache;

/// Short alias for [`SortedDict`].
pub type Sdict<K, V, C> = SortedDict<K, V, C>;
/// Short alias for [`AlphaSortedDict`].
pub type Adict<V> = AlphaSortedDict<V>;

/// A stored value plus the sequence number its key was first inserted with.
#[derive(Clone, Debug)]
pub(crate) struct Slot<V> {
    pub(crate) value: V,
    pub(crate) seq: u64,
}

/// A hash map that iterates its keys in ascending order of `order_key(key)`.
///
/// The entries live in a plain `HashMap`. The ascending key sequence is computed lazily
/// on the first ordered read (`keys`, `values`, `iter`, `index_of`, rendering) and reused
/// until a key is added or removed. Overwriting the value of an existing key keeps the
/// cached order. Removing a key drops it from a valid cache in place instead of forcing a
/// full re-sort.
///
/// Keys whose projections compare equal are presented in the order they were first
/// inserted, so iteration order is fully deterministic.
///
/// The ordering function is shared, never re-derived: `clone` (the shallow copy) and
/// [`deep_copy`](DeepClone::deep_copy) both hand the same function to the new map.
#[derive_where(Clone; K, V)]
pub struct SortedDict<K, V, C> {
    map: HashMap<K, Slot<V>>,
    cache: OrderCache<K>,
    order_key: OrderKey<K, C>,
    next_seq: u64,
}

impl<K, V, C> SortedDict<K, V, C> {
    pub fn new(order_key: impl Fn(&K) -> C + 'static) -> Self {
        Self::with_order_key(OrderKey::new(order_key))
    }

    pub fn with_order_key(order_key: OrderKey<K, C>) -> Self {
        Self {
            map: HashMap::new(),
            cache: OrderCache::new(),
            order_key,
            next_seq: 0,
        }
    }

    /// Starts a builder; its [`build`](SortedDictBuilder::build) fails if no ordering
    /// function was supplied.
    pub fn builder() -> SortedDictBuilder<K, V, C> {
        SortedDictBuilder::new()
    }

    pub fn order_key(&self) -> &OrderKey<K, C> {
        &self.order_key
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash, V, C> SortedDict<K, V, C> {
    pub fn with_entries(
        order_key: impl Fn(&K) -> C + 'static,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let mut dict = Self::new(order_key);
        dict.update(entries);
        dict
    }

    /// Insert a key-value pair.
    /// - If the key is new: invalidates the cached order; returns `None`.
    /// - If the key exists: replaces the value in place; returns `Some(old_v)`.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut occupied_entry) => Some(occupied_entry.insert(value)),
            Entry::Vacant(vacant_entry) => {
                vacant_entry.insert(value);
                None
            }
        }
    }

    pub fn get<Q: Eq + Hash + ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        self.map.get(key).map(|slot| &slot.value)
    }

    pub fn try_get<Q: Eq + Hash + ?Sized>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn get_or<'a, Q: Eq + Hash + ?Sized>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn get_mut<Q: Eq + Hash + ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
    {
        self.map.get_mut(key).map(|slot| &mut slot.value)
    }

    pub fn contains_key<Q: Eq + Hash + ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.map.contains_key(key)
    }

    /// Removes `key` if present and returns its value.
    pub fn remove<Q: Eq + Hash + ?Sized>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q: Eq + Hash + ?Sized>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
    {
        let (k, slot) = self.map.remove_entry(key)?;
        self.cache.remove::<K>(&k);
        Some((k, slot.value))
    }

    /// Removes `key`, failing with [`Error::KeyNotFound`] if it is absent.
    pub fn delete<Q: Eq + Hash + ?Sized>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
    {
        self.remove(key).map(drop).ok_or(Error::KeyNotFound)
    }

    /// Removes and returns the value for `key`. Without a default, a missing key is an
    /// error; see [`pop_or`](Self::pop_or).
    pub fn pop<Q: Eq + Hash + ?Sized>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
    {
        self.remove(key).ok_or(Error::KeyNotFound)
    }

    /// Removes and returns the value for `key`, or returns `default` if it is absent.
    pub fn pop_or<Q: Eq + Hash + ?Sized>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
    {
        self.remove(key).unwrap_or(default)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.cache.invalidate();
    }

    /// Returns the value for `key`, inserting `default` first if the key is absent.
    pub fn set_default(&mut self, key: K, default: V) -> &mut V {
        self.entry(key).or_insert(default)
    }

    /// Inserts every pair from `entries`. The cached order is dropped at most once, and
    /// only if a new key arrived.
    pub fn update(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        use std::collections::hash_map::Entry as StdEntry;

        let mut added = 0usize;
        for (key, value) in entries {
            match self.map.entry(key) {
                StdEntry::Occupied(mut occupied) => occupied.get_mut().value = value,
                StdEntry::Vacant(vacant) => {
                    vacant.insert(Slot {
                        value,
                        seq: self.next_seq,
                    });
                    self.next_seq += 1;
                    added += 1;
                }
            }
        }
        if added > 0 {
            self.cache.invalidate();
        }
    }

    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let Self {
            map,
            cache,
            next_seq,
            ..
        } = self;
        Entry::new(map.entry(key), cache, next_seq)
    }

    /// Entries in first-insertion order. Used where order must carry over to a copy.
    pub(crate) fn entries_by_seq(&self) -> Vec<(&K, &V)> {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_unstable_by_key(|(_, slot)| slot.seq);
        entries
            .into_iter()
            .map(|(k, slot)| (k, &slot.value))
            .collect()
    }
}

impl<K: Clone + Eq + Hash, V, C: Ord> SortedDict<K, V, C> {
    fn sorted_keys(&self) -> &[K] {
        self.cache.ensure_built(&self.map, &self.order_key)
    }

    /// Iterator over (&K, &V) in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            keys: self.sorted_keys().iter(),
            map: &self.map,
        }
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> slice::Iter<'_, K> {
        self.sorted_keys().iter()
    }

    /// Returns an iterator over values, in ascending order of their keys.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, v)| v)
    }

    /// Position of `key` in ascending order.
    pub fn index_of<Q: Eq + Hash + ?Sized>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
    {
        self.cache.index_of(&self.map, &self.order_key, key)
    }

    /// The entry at position `index` in ascending order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        let key = self.sorted_keys().get(index)?;
        Some((key, &self.map[key].value))
    }
}

/// Iterator over the entries of a [`SortedDict`] in ascending key order.
pub struct Iter<'a, K, V> {
    keys: slice::Iter<'a, K>,
    map: &'a HashMap<K, Slot<V>>,
}

impl<'a, K: Eq + Hash, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, map) = (self.keys.next()?, self.map);
        Some((key, &map[key].value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K: Eq + Hash, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (key, map) = (self.keys.next_back()?, self.map);
        Some((key, &map[key].value))
    }
}

impl<K: Eq + Hash, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: Eq + Hash, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.keys.len())
            .finish()
    }
}

impl<'a, K: Clone + Eq + Hash, V, C: Ord> IntoIterator for &'a SortedDict<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Eq + Hash, V, C> Extend<(K, V)> for SortedDict<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.update(iter);
    }
}

impl<K, V, C, Q> Index<&Q> for SortedDict<K, V, C>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present, like `HashMap`'s indexing.
    fn index(&self, key: &Q) -> &V {
        &self.map[key].value
    }
}

/// Two maps are equal when they hold the same bindings; the ordering functions are
/// not compared.
impl<K: Eq + Hash, V: PartialEq, C, C2> PartialEq<SortedDict<K, V, C2>> for SortedDict<K, V, C> {
    fn eq(&self, other: &SortedDict<K, V, C2>) -> bool {
        self.len() == other.len()
            && self
                .map
                .iter()
                .all(|(k, slot)| other.get(k).is_some_and(|v| slot.value == *v))
    }
}

impl<K: Eq + Hash, V: Eq, C> Eq for SortedDict<K, V, C> {}

impl<K: Eq + Hash, V: PartialEq, C> PartialEq<HashMap<K, V>> for SortedDict<K, V, C> {
    fn eq(&self, other: &HashMap<K, V>) -> bool {
        self.len() == other.len()
            && self
                .map
                .iter()
                .all(|(k, slot)| other.get(k).is_some_and(|v| slot.value == *v))
    }
}

impl<K, V, C> fmt::Debug for SortedDict<K, V, C>
where
    K: fmt::Debug + Clone + Eq + Hash,
    V: fmt::Debug,
    C: Ord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> fmt::Display for SortedDict<K, V, C>
where
    K: Render + Clone + Eq + Hash,
    V: Render,
    C: Ord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
