use std::fmt::{self, Write};
use std::ops::{Deref, DerefMut};

use crate::SortedDict;
use crate::deep_clone::{CloneMemo, DeepClone, Reconstruct};
use crate::error::{Error, Result};
use crate::render::{Render, RenderPath};

/// A [`SortedDict`] with text keys in case-insensitive alphabetical order.
///
/// Every key passed to a mutating method is first rendered through its `Display`
/// implementation, so `1` and `"1"` name the same entry. Reads go through `Deref` to the
/// inner map and take `&str`.
///
/// ```
/// use sorted_dict::AlphaSortedDict;
///
/// let mut dict = AlphaSortedDict::from_entries([("x", 0), ("y", 1), ("z", 2)]).unwrap();
/// dict.insert("a", 10).unwrap();
/// assert_eq!(dict.keys().collect::<Vec<_>>(), ["a", "x", "y", "z"]);
/// assert_eq!(dict.values().copied().collect::<Vec<_>>(), [10, 0, 1, 2]);
/// ```
#[derive(Clone)]
pub struct AlphaSortedDict<V> {
    inner: SortedDict<String, V, String>,
}

#[allow(clippy::ptr_arg)]
fn alphabetical(key: &String) -> String {
    key.to_lowercase()
}

/// Renders `key` as text, surfacing a failing `Display` impl instead of panicking.
fn coerce_key(key: impl fmt::Display) -> Result<String> {
    let mut text = String::new();
    write!(text, "{key}").map_err(|_| Error::KeyCoercion)?;
    Ok(text)
}

fn coerce_entries<K: fmt::Display, V>(
    entries: impl IntoIterator<Item = (K, V)>,
) -> Result<Vec<(String, V)>> {
    entries
        .into_iter()
        .map(|(key, value)| Ok((coerce_key(key)?, value)))
        .collect()
}

impl<V> AlphaSortedDict<V> {
    pub fn new() -> Self {
        Self {
            inner: SortedDict::new(alphabetical),
        }
    }

    /// Builds a map from any pairs whose keys can be displayed. Also serves as the
    /// keyword-style constructor when fed `(&str, V)` pairs.
    pub fn from_entries<K: fmt::Display>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self> {
        let mut dict = Self::new();
        dict.update(entries)?;
        Ok(dict)
    }

    pub fn insert<K: fmt::Display>(&mut self, key: K, value: V) -> Result<Option<V>> {
        let key = coerce_key(key)?;
        Ok(self.inner.insert(key, value))
    }

    pub fn set_default<K: fmt::Display>(&mut self, key: K, default: V) -> Result<&mut V> {
        let key = coerce_key(key)?;
        Ok(self.inner.set_default(key, default))
    }

    /// Inserts every pair. Nothing is inserted if any key fails to coerce.
    pub fn update<K: fmt::Display>(
        &mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()> {
        let entries = coerce_entries(entries)?;
        self.inner.update(entries);
        Ok(())
    }

    pub fn into_inner(self) -> SortedDict<String, V, String> {
        self.inner
    }
}

impl<V> Default for AlphaSortedDict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Deref for AlphaSortedDict<V> {
    type Target = SortedDict<String, V, String>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Keys reaching the inner map this way are already `String`s.
impl<V> DerefMut for AlphaSortedDict<V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<V: PartialEq> PartialEq for AlphaSortedDict<V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<V: Eq> Eq for AlphaSortedDict<V> {}

impl<V: fmt::Debug> fmt::Debug for AlphaSortedDict<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<V: Render> Render for AlphaSortedDict<V> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        self.inner.render_with(path)
    }
}

impl<V: Render> fmt::Display for AlphaSortedDict<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<V: DeepClone> Reconstruct for AlphaSortedDict<V> {
    fn make_empty_like(&self) -> Self {
        Self::new()
    }

    fn deep_fill(&self, target: &mut Self, memo: &mut CloneMemo) {
        self.inner.deep_fill(&mut target.inner, memo);
    }
}

impl<V: DeepClone> DeepClone for AlphaSortedDict<V> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        let mut copy = self.make_empty_like();
        self.deep_fill(&mut copy, memo);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unprintable;

    impl fmt::Display for Unprintable {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn failing_display_is_a_coercion_error() {
        let mut dict = AlphaSortedDict::from_entries([("a", 1)]).unwrap();
        assert_eq!(dict.insert(Unprintable, 2), Err(Error::KeyCoercion));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn failed_update_inserts_nothing() {
        #[derive(Clone, Copy)]
        enum Key {
            Good(&'static str),
            Bad,
        }
        impl fmt::Display for Key {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Key::Good(name) => f.write_str(name),
                    Key::Bad => Err(fmt::Error),
                }
            }
        }

        let mut dict = AlphaSortedDict::new();
        let result = dict.update([(Key::Good("a"), 1), (Key::Bad, 2)]);
        assert_eq!(result, Err(Error::KeyCoercion));
        assert!(dict.is_empty());
    }

    #[test]
    fn empty_like_keeps_alphabetical_order() {
        let dict = AlphaSortedDict::from_entries([("b", 1), ("A", 2)]).unwrap();
        let mut empty = dict.make_empty_like();
        assert!(empty.is_empty());
        empty.insert("Zed", 0).unwrap();
        empty.insert("alpha", 0).unwrap();
        assert_eq!(empty.keys().collect::<Vec<_>>(), ["alpha", "Zed"]);
    }
}
