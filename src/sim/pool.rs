//! Object pools for high-turnover entities
//!
//! A dense backing array plus a free-list stack. Slot indices are handed out
//! by `acquire` so callers never search for an entity to release it. Every
//! acquire stamps the slot with a fresh generation, which lets other entities
//! hold a [`SlotRef`] across ticks and revalidate it later.

use serde::Serialize;

/// Capability set a pooled entity must provide
pub trait Poolable: Default {
    /// Return to the freshly-constructed state
    fn reset(&mut self);
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// Weak reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotRef {
    pub index: usize,
    pub generation: u32,
}

/// Old-to-new slot indices produced by [`Pool::trim`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRemap {
    moved: Vec<Option<usize>>,
}

impl SlotRemap {
    /// New index of a slot that was held when the pool compacted
    pub fn index(&self, old: usize) -> Option<usize> {
        self.moved.get(old).copied().flatten()
    }

    /// Translate a reference taken before the compaction; `None` if its slot
    /// was already free
    pub fn slot(&self, slot: SlotRef) -> Option<SlotRef> {
        self.index(slot.index).map(|index| SlotRef {
            index,
            generation: slot.generation,
        })
    }
}

/// Lifetime counters for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoolStats {
    pub total_created: u64,
    pub total_reused: u64,
    pub current_active: usize,
    pub peak_active: usize,
}

impl PoolStats {
    /// Fraction of acquires served from the free list
    pub fn reuse_rate(&self) -> f64 {
        let total = self.total_created + self.total_reused;
        if total == 0 {
            0.0
        } else {
            self.total_reused as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pool<T: Poolable> {
    items: Vec<T>,
    /// Slot is handed out (not on the free list)
    held: Vec<bool>,
    generations: Vec<u32>,
    free: Vec<usize>,
    next_generation: u32,
    stats: PoolStats,
}

impl<T: Poolable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> Pool<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-warm `capacity` free slots
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self {
            items: Vec::with_capacity(capacity),
            held: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            next_generation: 1,
            stats: PoolStats::default(),
        };
        for _ in 0..capacity {
            pool.items.push(T::default());
            pool.held.push(false);
            pool.generations.push(0);
        }
        pool.stats.total_created = capacity as u64;
        pool.rebuild_free_list();
        pool
    }

    /// Take a slot, reset it and mark it active. Grows when the free list is empty.
    pub fn acquire(&mut self) -> (usize, &mut T) {
        let index = match self.free.pop() {
            Some(i) => {
                self.stats.total_reused += 1;
                i
            }
            None => {
                self.items.push(T::default());
                self.held.push(false);
                self.generations.push(0);
                self.stats.total_created += 1;
                self.items.len() - 1
            }
        };

        self.held[index] = true;
        self.generations[index] = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1).max(1);
        self.stats.current_active += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.stats.current_active);

        let item = &mut self.items[index];
        item.reset();
        item.set_active(true);
        (index, item)
    }

    /// Return a slot to the free list. `false` if the index is not held.
    pub fn release(&mut self, index: usize) -> bool {
        if index >= self.items.len() || !self.held[index] {
            log::warn!("pool release rejected for slot {index}");
            return false;
        }
        self.held[index] = false;
        self.items[index].set_active(false);
        self.free.push(index);
        self.stats.current_active = self.stats.current_active.saturating_sub(1);
        true
    }

    /// Release every held slot whose entity deactivated itself
    pub fn release_inactive(&mut self) -> usize {
        let mut released = 0;
        for i in 0..self.items.len() {
            if self.held[i] && !self.items[i].is_active() {
                self.held[i] = false;
                self.free.push(i);
                self.stats.current_active = self.stats.current_active.saturating_sub(1);
                released += 1;
            }
        }
        released
    }

    /// Release everything (run reset)
    pub fn release_all(&mut self) {
        for i in 0..self.items.len() {
            if self.held[i] {
                self.held[i] = false;
                self.items[i].set_active(false);
            }
        }
        self.rebuild_free_list();
        self.stats.current_active = 0;
    }

    /// Rebuild the free list from every slot whose entity is inactive
    pub fn acquire_all_inactive(&mut self) {
        for i in 0..self.items.len() {
            if !self.items[i].is_active() {
                self.held[i] = false;
            }
        }
        self.rebuild_free_list();
        self.stats.current_active = self.held.iter().filter(|h| **h).count();
    }

    fn rebuild_free_list(&mut self) {
        self.free.clear();
        // Reversed so the lowest index is popped first
        self.free
            .extend((0..self.items.len()).rev().filter(|&i| !self.held[i]));
    }

    /// Compact when the backing array is far larger than needed.
    ///
    /// Runs only if `len > 2 * max(min_capacity, 2 * active)`. Held slots are
    /// kept in slot order but renumbered; the returned [`SlotRemap`] translates
    /// outstanding [`SlotRef`]s to their new slots. Generations travel with the
    /// entities, so a reference that is not translated stops resolving.
    pub fn trim(&mut self, min_capacity: usize) -> Option<SlotRemap> {
        let active = self.active_count();
        let threshold = 2 * min_capacity.max(2 * active);
        if self.items.len() <= threshold {
            return None;
        }

        let keep = min_capacity.max(active);
        let mut items = Vec::with_capacity(keep);
        let mut generations = Vec::with_capacity(keep);
        let mut moved = vec![None; self.items.len()];
        for (i, item) in std::mem::take(&mut self.items).into_iter().enumerate() {
            if self.held[i] {
                moved[i] = Some(items.len());
                items.push(item);
                generations.push(self.generations[i]);
            }
        }
        self.held = vec![true; items.len()];
        self.items = items;
        self.generations = generations;
        self.free.clear();
        self.stats.current_active = self.items.len();
        Some(SlotRemap { moved })
    }

    /// Number of slots (held or free)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of held slots
    pub fn active_count(&self) -> usize {
        self.stats.current_active
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn is_held(&self, index: usize) -> bool {
        self.held.get(index).copied().unwrap_or(false)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if self.is_held(index) {
            self.items.get(index)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if self.is_held(index) {
            self.items.get_mut(index)
        } else {
            None
        }
    }

    /// Weak reference to a held slot
    pub fn slot_ref(&self, index: usize) -> Option<SlotRef> {
        if self.is_held(index) {
            Some(SlotRef {
                index,
                generation: self.generations[index],
            })
        } else {
            None
        }
    }

    /// Resolve a weak reference; `None` once the slot was released or reused
    /// or the entity deactivated itself
    pub fn resolve(&self, slot: SlotRef) -> Option<&T> {
        if self.is_held(slot.index) && self.generations[slot.index] == slot.generation {
            self.items.get(slot.index).filter(|item| item.is_active())
        } else {
            None
        }
    }

    /// Held slots whose entity is still active, in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .filter(move |(i, item)| self.held[*i] && item.is_active())
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        let held = &self.held;
        self.items
            .iter_mut()
            .enumerate()
            .filter(move |(i, item)| held[*i] && item.is_active())
    }

    /// Every held slot agrees with its entity's own active flag
    pub fn is_consistent(&self) -> bool {
        self.items
            .iter()
            .zip(&self.held)
            .all(|(item, held)| item.is_active() == *held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Dummy {
        active: bool,
        value: u32,
    }

    impl Poolable for Dummy {
        fn reset(&mut self) {
            *self = Self::default();
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[test]
    fn test_acquire_release_round_trip() {
        let mut pool: Pool<Dummy> = Pool::new();
        let (a, _) = pool.acquire();
        let before = (pool.active_count(), pool.len());
        let (b, item) = pool.acquire();
        item.value = 7;
        assert_ne!(a, b);
        assert!(pool.release(b));
        assert_eq!((pool.active_count(), pool.len()), before);
        assert!(pool.is_consistent());
    }

    #[test]
    fn test_release_rejects_bad_index() {
        let mut pool: Pool<Dummy> = Pool::new();
        assert!(!pool.release(0));
        let (i, _) = pool.acquire();
        assert!(pool.release(i));
        assert!(!pool.release(i));
    }

    #[test]
    fn test_reuse_resets_and_counts() {
        let mut pool: Pool<Dummy> = Pool::new();
        let (i, item) = pool.acquire();
        item.value = 3;
        pool.release(i);
        let (j, item) = pool.acquire();
        assert_eq!(i, j);
        assert_eq!(item.value, 0);
        let stats = pool.stats();
        assert_eq!(stats.total_created, 1);
        assert_eq!(stats.total_reused, 1);
        assert!((stats.reuse_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_generation_invalidates_slot_ref() {
        let mut pool: Pool<Dummy> = Pool::new();
        let (i, _) = pool.acquire();
        let r = pool.slot_ref(i).unwrap();
        assert!(pool.resolve(r).is_some());
        pool.release(i);
        assert!(pool.resolve(r).is_none());
        pool.acquire();
        assert!(pool.resolve(r).is_none());
    }

    #[test]
    fn test_release_inactive_collects_self_deactivated() {
        let mut pool: Pool<Dummy> = Pool::new();
        for _ in 0..4 {
            pool.acquire();
        }
        pool.get_mut(1).unwrap().active = false;
        pool.get_mut(3).unwrap().active = false;
        assert!(!pool.is_consistent());
        assert_eq!(pool.release_inactive(), 2);
        assert_eq!(pool.active_count(), 2);
        assert!(pool.is_consistent());
        let ids: Vec<usize> = pool.iter_active().map(|(i, _)| i).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_trim_preserves_active_set() {
        let mut pool: Pool<Dummy> = Pool::new();
        for n in 0..20 {
            let (_, item) = pool.acquire();
            item.value = n;
        }
        for i in 0..20 {
            if i % 7 != 0 {
                pool.release(i);
            }
        }
        let before: Vec<u32> = pool.iter_active().map(|(_, d)| d.value).collect();
        let remap = pool.trim(2).unwrap();
        let after: Vec<u32> = pool.iter_active().map(|(_, d)| d.value).collect();
        assert_eq!(before, after);
        assert_eq!(pool.len(), 3);
        assert!(pool.is_consistent());
        assert_eq!(remap.index(7), Some(1));
        assert_eq!(remap.index(8), None);
        // Small pools are left alone
        assert!(pool.trim(2).is_none());
    }

    #[test]
    fn test_acquire_all_inactive_rebuilds_free_list() {
        let mut pool: Pool<Dummy> = Pool::new();
        for _ in 0..3 {
            pool.acquire();
        }
        pool.get_mut(0).unwrap().active = false;
        pool.acquire_all_inactive();
        assert_eq!(pool.active_count(), 2);
        let (i, _) = pool.acquire();
        assert_eq!(i, 0);
    }

    #[test]
    fn test_with_capacity_prewarms() {
        let mut pool: Pool<Dummy> = Pool::with_capacity(4);
        assert_eq!(pool.len(), 4);
        let (i, _) = pool.acquire();
        assert_eq!(i, 0);
        assert_eq!(pool.stats().total_created, 4);
        assert_eq!(pool.stats().total_reused, 1);
        assert!(pool.stats().reuse_rate() <= 1.0);
    }

    #[test]
    fn test_trim_remap_keeps_slot_refs_resolving() {
        let mut pool: Pool<Dummy> = Pool::new();
        for n in 0..12 {
            let (_, item) = pool.acquire();
            item.value = n;
        }
        for i in 0..10 {
            pool.release(i);
        }
        let refs: Vec<SlotRef> = [10, 11].iter().filter_map(|&i| pool.slot_ref(i)).collect();
        let remap = pool.trim(0).unwrap();

        // Untranslated references go stale instead of aliasing another entity
        assert!(refs.iter().all(|r| pool.resolve(*r).is_none()));
        let values: Vec<u32> = refs
            .iter()
            .map(|r| pool.resolve(remap.slot(*r).unwrap()).unwrap().value)
            .collect();
        assert_eq!(values, vec![10, 11]);
        assert_eq!(remap.slot(SlotRef { index: 3, generation: 4 }), None);
    }
}
