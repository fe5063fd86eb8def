//! # Record Arena
//!
//! Slot storage for node and edge records, addressed by typed handles.
//! Freed slots are recycled through a free list, so a handle is only
//! meaningful while its record is alive.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A typed index into an [`Arena`].
pub(crate) trait Handle: Copy {
    fn from_slot(slot: usize) -> Self;
    fn slot(self) -> usize;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub(crate) struct $name(u32);

        impl Handle for $name {
            fn from_slot(slot: usize) -> Self {
                Self(slot as u32)
            }

            fn slot(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle of a node record.
    NodeIndex
);
handle!(
    /// Handle of an edge record.
    EdgeIndex
);

/// Vector of optional slots plus a free list.
#[derive(Debug, Clone)]
pub(crate) struct Arena<H, T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    live: usize,
    _handle: PhantomData<H>,
}

impl<H: Handle, T> Arena<H, T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            _handle: PhantomData,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> H {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                H::from_slot(slot)
            }
            None => {
                self.slots.push(Some(value));
                H::from_slot(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn remove(&mut self, handle: H) -> Option<T> {
        let taken = self.slots.get_mut(handle.slot())?.take()?;
        self.free.push(handle.slot());
        self.live -= 1;
        Some(taken)
    }

    pub(crate) fn get(&self, handle: H) -> Option<&T> {
        self.slots.get(handle.slot())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots.get_mut(handle.slot())?.as_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }
}

// Handles stored in tables and adjacency maps always point at live records,
// so indexing a freed slot is a broken internal invariant.
impl<H: Handle, T> Index<H> for Arena<H, T> {
    type Output = T;

    fn index(&self, handle: H) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => unreachable!("stale arena handle {}", handle.slot()),
        }
    }
}

impl<H: Handle, T> IndexMut<H> for Arena<H, T> {
    fn index_mut(&mut self, handle: H) -> &mut T {
        let slot = handle.slot();
        match self.get_mut(handle) {
            Some(value) => value,
            None => unreachable!("stale arena handle {slot}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_index() {
        let mut arena: Arena<NodeIndex, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn removed_slots_are_recycled() {
        let mut arena: Arena<EdgeIndex, u32> = Arena::new();
        let first = arena.insert(1);
        let _second = arena.insert(2);
        assert_eq!(arena.remove(first), Some(1));
        assert!(arena.get(first).is_none());
        assert_eq!(arena.remove(first), None);

        let third = arena.insert(3);
        assert_eq!(third, first);
        assert_eq!(arena[third], 3);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut arena: Arena<NodeIndex, u32> = Arena::new();
        arena.insert(1);
        arena.insert(2);
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.iter_mut().count(), 0);
    }
}
