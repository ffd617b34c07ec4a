//! Typed, generation-checked handles into a [`ResourceManager`](crate::ResourceManager).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Index + generation pair tagged with the resource type it points at.
///
/// A handle is only valid while the generation stored at `index` matches its
/// own; once the slot is released the generation moves on and every copy of
/// the old handle resolves to nothing.
pub struct Handle<T> {
    index: u32,
    generation: u16,
    _tag: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: u32, generation: u16) -> Self {
        Self {
            index,
            generation,
            _tag: PhantomData,
        }
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u16 {
        self.generation
    }
}

// Manual impls: derives would put bounds on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        write!(f, "Handle<{short}>({}v{})", self.index, self.generation)
    }
}
