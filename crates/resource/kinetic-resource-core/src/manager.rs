//! Handle-indexed arena.
//!
//! Storage is a dense `Vec` of slots plus a stack of free indices. Releasing a
//! slot drops its value and bumps the slot generation, so stale handles are
//! rejected by every accessor. A slot whose generation would wrap around is
//! retired instead of recycled.

use crate::handle::Handle;

const DEFAULT_COMPACT_THRESHOLD: usize = 64;

#[derive(Debug)]
struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

#[derive(Debug)]
pub struct ResourceManager<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    released_since_compact: usize,
    compact_threshold: usize,
}

impl<T> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceManager<T> {
    pub fn new() -> Self {
        Self::with_compact_threshold(DEFAULT_COMPACT_THRESHOLD)
    }

    /// `threshold` is the number of releases after which the next `insert`
    /// rebuilds the free list (lowest indices first).
    pub fn with_compact_threshold(threshold: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            released_since_compact: 0,
            compact_threshold: threshold.max(1),
        }
    }

    /// Acquire a default-initialised resource.
    pub fn acquire(&mut self) -> Handle<T>
    where
        T: Default,
    {
        self.insert(T::default())
    }

    /// Store `value` and return its handle. Amortized O(1).
    pub fn insert(&mut self, value: T) -> Handle<T> {
        if self.released_since_compact >= self.compact_threshold {
            self.compact();
        }
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).expect("resource manager exceeded u32 slots");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle::new(index, 0)
    }

    /// Release the resource behind `handle`, returning it. Stale or foreign
    /// handles are ignored.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        self.live -= 1;
        self.released_since_compact += 1;
        match slot.generation.checked_add(1) {
            Some(next) => {
                slot.generation = next;
                self.free.push(handle.index());
            }
            None => {
                log::debug!("retiring resource slot {} after generation wrap", handle.index());
            }
        }
        Some(value)
    }

    #[inline]
    pub fn data(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    #[inline]
    pub fn data_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.data(handle).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated, live or free.
    #[inline]
    pub fn capacity_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (Handle::new(i as u32, slot.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|v| (Handle::new(i as u32, generation), v))
        })
    }

    /// Drop every resource. Outstanding handles become stale.
    pub fn clear(&mut self) {
        let handles: Vec<Handle<T>> = self.iter().map(|(h, _)| h).collect();
        for h in handles {
            self.release(h);
        }
    }

    /// Reorder the free list so the lowest indices are reused first, keeping
    /// the live set packed towards the front of the slot array.
    fn compact(&mut self) {
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        self.free.shrink_to_fit();
        self.released_since_compact = 0;
        log::trace!(
            "compacted resource free list: {} free of {} slots",
            self.free.len(),
            self.slots.len()
        );
    }
}
