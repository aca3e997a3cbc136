use std::borrow::Borrow;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use crate::Slot;
use crate::error::{Error, Result};

/// A shared handle to the function that projects a key onto its sort position.
///
/// Cloning an `OrderKey` shares the underlying function, so copies of a
/// [`SortedDict`](crate::SortedDict) order their keys with the very same function.
pub struct OrderKey<K, C>(Rc<dyn Fn(&K) -> C>);

impl<K, C> OrderKey<K, C> {
    pub fn new(order_key: impl Fn(&K) -> C + 'static) -> Self {
        Self(Rc::new(order_key))
    }

    pub fn project(&self, key: &K) -> C {
        (self.0)(key)
    }

    /// Returns `true` if both handles share one function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<K, C> Clone for OrderKey<K, C> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<K, C> fmt::Debug for OrderKey<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OrderKey").finish_non_exhaustive()
    }
}

/// Lazily computed ascending key sequence.
///
/// The cell is uninitialised whenever the cached order may be stale. Keys are ranked by
/// `(order_key(key), seq)`, where `seq` is the key's first-insertion sequence number, so
/// keys whose projections compare equal keep their insertion order and every rank is
/// unique.
#[derive(Clone, Debug)]
pub(crate) struct OrderCache<K> {
    sorted: OnceCell<Vec<K>>,
}

impl<K> OrderCache<K> {
    pub(crate) fn new() -> Self {
        Self {
            sorted: OnceCell::new(),
        }
    }

    pub(crate) fn invalidate(&mut self) {
        if self.sorted.take().is_some() {
            trace!("order cache invalidated");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_valid(&self) -> bool {
        self.sorted.get().is_some()
    }

    /// Drops `key` from a valid cache without disturbing the order of the rest.
    /// An invalid cache stays invalid.
    pub(crate) fn remove<Q: Eq + ?Sized>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
    {
        let Some(sorted) = self.sorted.get_mut() else {
            return;
        };
        if let Some(pos) = sorted.iter().position(|k| Borrow::<Q>::borrow(k) == key) {
            sorted.remove(pos);
            trace!(pos, remaining = sorted.len(), "removed key from order cache");
        }
    }
}

impl<K: Clone + Eq + Hash> OrderCache<K> {
    pub(crate) fn ensure_built<V, C: Ord>(
        &self,
        map: &HashMap<K, Slot<V>>,
        order_key: &OrderKey<K, C>,
    ) -> &[K] {
        self.sorted.get_or_init(|| {
            let mut ranked: Vec<_> = map
                .iter()
                .map(|(k, slot)| ((order_key.project(k), slot.seq), k))
                .collect();
            ranked.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Vec<K> = ranked.into_iter().map(|(_, k)| k.clone()).collect();
            debug_assert_eq!(sorted.len(), map.len());
            trace!(len = sorted.len(), "rebuilt order cache");
            sorted
        })
    }

    /// Position of `key` in ascending order.
    pub(crate) fn index_of<V, C: Ord, Q: Eq + Hash + ?Sized>(
        &self,
        map: &HashMap<K, Slot<V>>,
        order_key: &OrderKey<K, C>,
        key: &Q,
    ) -> Result<usize>
    where
        K: Borrow<Q>,
    {
        let (stored, slot) = map.get_key_value(key).ok_or(Error::KeyNotFound)?;
        let target = (order_key.project(stored), slot.seq);
        self.ensure_built(map, order_key)
            .binary_search_by(|k| {
                let seq = map.get::<K>(k).map_or(u64::MAX, |slot| slot.seq);
                (order_key.project(k), seq).cmp(&target)
            })
            .map_err(|_| Error::KeyNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(entries: &[(&'static str, u64)]) -> HashMap<&'static str, Slot<()>> {
        entries
            .iter()
            .map(|&(k, seq)| (k, Slot { value: (), seq }))
            .collect()
    }

    #[test]
    fn builds_once_and_serves_from_cache() {
        use std::cell::Cell;

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let order_key = OrderKey::new(move |k: &&'static str| {
            counter.set(counter.get() + 1);
            k.to_string()
        });
        let map = slots(&[("b", 0), ("a", 1), ("c", 2)]);
        let cache = OrderCache::new();
        assert!(!cache.is_valid());

        assert_eq!(cache.ensure_built(&map, &order_key), &["a", "b", "c"]);
        let after_build = calls.get();
        assert_eq!(cache.ensure_built(&map, &order_key), &["a", "b", "c"]);
        assert_eq!(calls.get(), after_build);
        assert!(cache.is_valid());
    }

    #[test]
    fn equal_projections_keep_insertion_order() {
        let order_key = OrderKey::new(|k: &&'static str| k.len());
        let map = slots(&[("bb", 3), ("aa", 1), ("c", 7), ("zz", 0)]);
        let cache = OrderCache::new();
        assert_eq!(cache.ensure_built(&map, &order_key), &["c", "zz", "aa", "bb"]);
        assert_eq!(cache.index_of(&map, &order_key, "aa"), Ok(2));
        assert_eq!(cache.index_of(&map, &order_key, "bb"), Ok(3));
        assert_eq!(cache.index_of(&map, &order_key, "nope"), Err(Error::KeyNotFound));
    }

    #[test]
    fn surgical_remove_only_touches_a_valid_cache() {
        let order_key = OrderKey::new(|k: &&'static str| *k);
        let map = slots(&[("a", 0), ("b", 1), ("c", 2)]);
        let mut cache = OrderCache::new();

        cache.remove("b");
        assert!(!cache.is_valid());

        cache.ensure_built(&map, &order_key);
        cache.remove("b");
        assert_eq!(cache.sorted.get().map(Vec::as_slice), Some(&["a", "c"][..]));

        cache.invalidate();
        assert!(!cache.is_valid());
    }

    #[test]
    fn empty_store_builds_empty_cache() {
        let order_key = OrderKey::new(|k: &&'static str| *k);
        let map = slots(&[]);
        let cache = OrderCache::new();
        assert!(cache.ensure_built(&map, &order_key).is_empty());
    }
}
