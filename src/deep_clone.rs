//! Deep copies that preserve the map variant and survive cyclic value graphs.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::debug;

use crate::SortedDict;

/// Clones already made during one deep copy, keyed by the identity of their source.
#[derive(Default)]
pub struct CloneMemo {
    clones: HashMap<(usize, TypeId), Box<dyn Any>>,
}

impl CloneMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The clone recorded for `source`, if any.
    pub fn get<S: ?Sized, T: Clone + 'static>(&self, source: &S) -> Option<T> {
        self.clones
            .get(&(identity(source), TypeId::of::<T>()))?
            .downcast_ref::<T>()
            .cloned()
    }

    /// Records `clone` as the copy of `source`. Must happen before the source's children
    /// are copied, so that a child leading back to `source` finds it.
    pub fn insert<S: ?Sized, T: 'static>(&mut self, source: &S, clone: T) {
        self.clones
            .insert((identity(source), TypeId::of::<T>()), Box::new(clone));
    }

    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

impl fmt::Debug for CloneMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneMemo")
            .field("len", &self.clones.len())
            .finish()
    }
}

fn identity<T: ?Sized>(value: &T) -> usize {
    std::ptr::from_ref(value).cast::<()>().addr()
}

/// A value that can produce an independent copy of itself and everything it owns.
pub trait DeepClone: Sized {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self;

    fn deep_copy(&self) -> Self {
        self.deep_clone(&mut CloneMemo::new())
    }
}

/// A container that knows how to build an empty instance of its own configuration and
/// then fill it. Splitting the two lets shared containers be registered in a
/// [`CloneMemo`] before their contents are copied.
pub trait Reconstruct: Sized {
    fn make_empty_like(&self) -> Self;

    fn deep_fill(&self, target: &mut Self, memo: &mut CloneMemo);
}

impl<T: Reconstruct + 'static> DeepClone for Rc<RefCell<T>> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        let source: &RefCell<T> = self;
        if let Some(done) = memo.get::<_, Self>(source) {
            return done;
        }
        let original = source.borrow();
        let shell = Rc::new(RefCell::new(original.make_empty_like()));
        memo.insert(source, Rc::clone(&shell));
        original.deep_fill(&mut shell.borrow_mut(), memo);
        shell
    }
}

/// Values reached through several handles stay shared in the copy.
impl<T: DeepClone + 'static> DeepClone for Rc<T> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        let source: &T = self;
        if let Some(done) = memo.get::<_, Self>(source) {
            return done;
        }
        let copy = Rc::new(source.deep_clone(memo));
        memo.insert(source, Rc::clone(&copy));
        copy
    }
}

impl<K, V, C> Reconstruct for SortedDict<K, V, C>
where
    K: DeepClone + Eq + Hash,
    V: DeepClone,
{
    fn make_empty_like(&self) -> Self {
        Self::with_order_key(self.order_key().clone())
    }

    /// Copies entries in first-insertion order, so ties between equal projections come
    /// out the same way in the copy.
    fn deep_fill(&self, target: &mut Self, memo: &mut CloneMemo) {
        for (key, value) in self.entries_by_seq() {
            let key = key.deep_clone(memo);
            let value = value.deep_clone(memo);
            target.insert(key, value);
        }
    }
}

impl<K, V, C> DeepClone for SortedDict<K, V, C>
where
    K: DeepClone + Eq + Hash,
    V: DeepClone,
{
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        debug!(len = self.len(), "deep copying sorted dict");
        let mut copy = self.make_empty_like();
        self.deep_fill(&mut copy, memo);
        copy
    }
}

macro_rules! deep_clone_via_clone {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepClone for $ty {
                fn deep_clone(&self, _memo: &mut CloneMemo) -> Self {
                    self.clone()
                }
            }
        )*
    };
}

deep_clone_via_clone!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, (),
    String, &'static str
);

macro_rules! deep_clone_tuple {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty: DeepClone),+> DeepClone for ($($ty,)+) {
            fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
                let ($($var,)+) = self;
                ($($var.deep_clone(memo),)+)
            }
        }
    };
}

deep_clone_tuple!(A a);
deep_clone_tuple!(A a, B b);
deep_clone_tuple!(A a, B b, C c);
deep_clone_tuple!(A a, B b, C c, D d);

impl<T: DeepClone> DeepClone for Option<T> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        self.as_ref().map(|inner| inner.deep_clone(memo))
    }
}

impl<T: DeepClone> DeepClone for Box<T> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        Box::new((**self).deep_clone(memo))
    }
}

impl<T: DeepClone> DeepClone for Vec<T> {
    fn deep_clone(&self, memo: &mut CloneMemo) -> Self {
        self.iter().map(|item| item.deep_clone(memo)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_is_keyed_by_identity_and_type() {
        let (a, b) = (String::from("same"), String::from("same"));
        let mut memo = CloneMemo::new();
        memo.insert(&a, 1u32);
        assert_eq!(memo.get::<_, u32>(&a), Some(1));
        assert_eq!(memo.get::<_, u32>(&b), None);
        assert_eq!(memo.get::<_, i64>(&a), None);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn shared_cell_is_copied_once() {
        let shared = Rc::new(RefCell::new(SortedDict::new(|k: &u8| *k)));
        shared.borrow_mut().insert(1u8, 10i32);
        let pair = vec![Rc::clone(&shared), Rc::clone(&shared)];

        let copy = pair.deep_copy();
        assert!(Rc::ptr_eq(&copy[0], &copy[1]));
        assert!(!Rc::ptr_eq(&copy[0], &shared));
        assert_eq!(*copy[0].borrow(), *shared.borrow());
    }

    #[test]
    fn shared_rc_stays_shared() {
        let text = Rc::new(String::from("shared"));
        let other = Rc::new(String::from("shared"));
        let triple = (Rc::clone(&text), Rc::clone(&text), other);

        let (first, second, third) = triple.deep_copy();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(!Rc::ptr_eq(&first, &third));
        assert!(!Rc::ptr_eq(&first, &text));
        assert_eq!(*first, "shared");
    }
}
