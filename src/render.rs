//! Human-readable rendering that survives self-referencing values.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::SortedDict;

/// Substituted for a map that is already being rendered further up the descent.
pub const RECURSION_MARKER: &str = "**RECURSION**";

/// Substituted for a `RefCell` that is mutably borrowed while rendering.
const BORROWED_MARKER: &str = "<borrowed>";

/// The maps entered on the current rendering descent, by address.
///
/// Only ancestry counts: a map is pushed on entry and popped on exit, so two siblings
/// holding the same nested map render it twice rather than tripping the marker.
#[derive(Debug, Default)]
pub struct RenderPath {
    ancestors: Vec<usize>,
}

impl RenderPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `node` and returns `true`, or returns `false` if it is already an ancestor.
    pub fn enter<T: ?Sized>(&mut self, node: &T) -> bool {
        let addr = address_of(node);
        if self.ancestors.contains(&addr) {
            return false;
        }
        self.ancestors.push(addr);
        true
    }

    pub fn leave<T: ?Sized>(&mut self, node: &T) {
        let popped = self.ancestors.pop();
        debug_assert_eq!(popped, Some(address_of(node)));
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

fn address_of<T: ?Sized>(node: &T) -> usize {
    std::ptr::from_ref(node).cast::<()>().addr()
}

/// A value that can render itself, passing the current descent along to its children.
pub trait Render {
    fn render_with(&self, path: &mut RenderPath) -> String;

    fn render(&self) -> String {
        self.render_with(&mut RenderPath::new())
    }
}

/// Renders `{k1: v1, k2: v2}`, or the recursion marker if `node` is an ancestor.
pub(crate) fn render_map<'a, T, K, V, I>(node: &T, entries: I, path: &mut RenderPath) -> String
where
    T: ?Sized,
    K: Render + 'a + ?Sized,
    V: Render + 'a + ?Sized,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    if !path.enter(node) {
        return RECURSION_MARKER.to_owned();
    }
    let mut parts = Vec::new();
    for (k, v) in entries {
        let key = k.render_with(path);
        let value = v.render_with(path);
        parts.push(format!("{key}: {value}"));
    }
    path.leave(node);
    format!("{{{}}}", parts.join(", "))
}

impl<K, V, C> Render for SortedDict<K, V, C>
where
    K: Render + Clone + Eq + Hash,
    V: Render,
    C: Ord,
{
    fn render_with(&self, path: &mut RenderPath) -> String {
        render_map(self, self.iter(), path)
    }
}

/// Renders any `Debug` value. The fallback for values with no [`Render`] impl of their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugRender<T>(pub T);

impl<T: fmt::Debug> Render for DebugRender<T> {
    fn render_with(&self, _path: &mut RenderPath) -> String {
        format!("{:?}", self.0)
    }
}

macro_rules! render_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Render for $ty {
                fn render_with(&self, _path: &mut RenderPath) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

macro_rules! render_via_debug {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Render for $ty {
                fn render_with(&self, _path: &mut RenderPath) -> String {
                    format!("{self:?}")
                }
            }
        )*
    };
}

render_via_display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool
);
render_via_debug!(char, str, String);

impl<T: Render + ?Sized> Render for &T {
    fn render_with(&self, path: &mut RenderPath) -> String {
        (**self).render_with(path)
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        (**self).render_with(path)
    }
}

impl<T: Render + ?Sized> Render for Rc<T> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        (**self).render_with(path)
    }
}

impl<T: Render + ?Sized> Render for RefCell<T> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        match self.try_borrow() {
            Ok(inner) => inner.render_with(path),
            Err(_) => BORROWED_MARKER.to_owned(),
        }
    }
}

impl<T: Render> Render for Option<T> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        match self {
            Some(inner) => inner.render_with(path),
            None => "None".to_owned(),
        }
    }
}

impl<T: Render> Render for [T] {
    fn render_with(&self, path: &mut RenderPath) -> String {
        let items: Vec<_> = self.iter().map(|item| item.render_with(path)).collect();
        format!("[{}]", items.join(", "))
    }
}

impl<T: Render> Render for Vec<T> {
    fn render_with(&self, path: &mut RenderPath) -> String {
        self.as_slice().render_with(path)
    }
}
