use std::fmt;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::{OrderKey, SortedDict};

/// Collects the ordering function and initial entries for a [`SortedDict`].
///
/// ```
/// use sorted_dict::{Error, SortedDict};
///
/// let dict = SortedDict::builder()
///     .order_by(|k: &String| k.len())
///     .entries([("three".to_string(), 3)])
///     .named("one", 1)
///     .build()
///     .unwrap();
/// assert_eq!(dict.keys().collect::<Vec<_>>(), ["one", "three"]);
///
/// let missing = SortedDict::<String, i32, usize>::builder().named("x", 0).build();
/// assert_eq!(missing.err(), Some(Error::MissingOrderKey));
/// ```
pub struct SortedDictBuilder<K, V, C> {
    order_key: Option<OrderKey<K, C>>,
    entries: Vec<(K, V)>,
}

impl<K, V, C> SortedDictBuilder<K, V, C> {
    pub(crate) fn new() -> Self {
        Self {
            order_key: None,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn order_by(self, order_key: impl Fn(&K) -> C + 'static) -> Self {
        self.order_key(OrderKey::new(order_key))
    }

    #[must_use]
    pub fn order_key(mut self, order_key: OrderKey<K, C>) -> Self {
        self.order_key = Some(order_key);
        self
    }

    /// Initial entries. They are copied in, later pairs overwrite earlier ones.
    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// A single keyword-style entry whose key is always text.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: V) -> Self
    where
        K: From<String>,
    {
        self.entries.push((K::from(name.into()), value));
        self
    }

    pub fn build(self) -> Result<SortedDict<K, V, C>>
    where
        K: Eq + Hash,
    {
        let Self { order_key, entries } = self;
        let order_key = order_key.ok_or(Error::MissingOrderKey)?;
        let mut dict = SortedDict::with_order_key(order_key);
        dict.update(entries);
        Ok(dict)
    }
}

impl<K, V, C> fmt::Debug for SortedDictBuilder<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedDictBuilder")
            .field("has_order_key", &self.order_key.is_some())
            .field("entries", &self.entries.len())
            .finish()
    }
}
