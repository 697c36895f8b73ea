//! # Entity — Small Integer Handles
//!
//! An [`Entity`] is just a number. The [`World`](super::world::World) maps
//! entities to their components; the entity itself carries nothing.
//!
//! ## One Numbering Space
//!
//! Component-type ids and entity ids come out of the same allocator. Every
//! registered component type reserves its id as an entity in each store, so
//! runtime entities always number above the component types:
//!
//! ```text
//! ids:  0        1         2      3  4  5 ...
//!       ChildOf  Position  Level  e  e  e
//!       └─ reserved by the registry ─┘
//! ```
//!
//! ## Reuse
//!
//! There is no generation counter. A destroyed entity's id goes back to the
//! allocator and the next `create` may hand out the same number. The store
//! guarantees a reused id starts clean: no components, no reverse-index
//! entries, no relationship memberships.
//!
//! ## The Allocator
//!
//! [`IdAllocator`] is a bit vector where a set bit means "free":
//!
//! ```text
//! free:   [0b…1111_0000, 0b…1111_1111]   ← ids 0..=3 in use
//! cursor: 0                               ← first word that may have a free bit
//! ```
//!
//! `alloc` starts at the cursor instead of rescanning from zero, and doubles
//! the word vector once the cursor runs off the end. `free` sets the bit back
//! and rewinds the cursor if the freed id sits before it.

use std::fmt;

/// A lightweight handle to an entity in a [`World`](super::world::World).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(pub(crate) u32);

impl Entity {
    /// Returns the raw id.
    pub fn index(self) -> u32 {
        self.0
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {}", self.0)
    }
}

/// Process-wide id of a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Returns the raw id.
    pub fn index(self) -> u32 {
        self.0
    }

    /// The entity reserved for this component type in every store.
    pub fn as_entity(self) -> Entity {
        Entity(self.0)
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

const WORD_BITS: usize = 64;

/// Hands out and reclaims small integer ids.
#[derive(Clone)]
pub struct IdAllocator {
    /// One bit per id; set means free.
    free: Vec<u64>,
    /// Index of the first word that may still contain a free bit.
    cursor: usize,
}

impl IdAllocator {
    /// Creates an allocator with a single word of free ids.
    pub fn new() -> Self {
        Self {
            free: vec![u64::MAX],
            cursor: 0,
        }
    }

    /// Creates an allocator whose allocated ids match `other`'s exactly.
    ///
    /// Used to seed a fresh store with every registered component id already
    /// marked in use.
    pub fn seeded_from(other: &IdAllocator) -> Self {
        other.clone()
    }

    /// Allocates the lowest free id at or after the cursor.
    pub fn alloc(&mut self) -> usize {
        loop {
            if self.cursor >= self.free.len() {
                let doubled = (self.free.len() * 2).max(1);
                self.free.resize(doubled, u64::MAX);
            }

            let word = self.free[self.cursor];
            if word == 0 {
                self.cursor += 1;
                continue;
            }

            let bit = word.trailing_zeros() as usize;
            self.free[self.cursor] &= !(1u64 << bit);
            let id = self.cursor * WORD_BITS + bit;
            if self.free[self.cursor] == 0 {
                self.cursor += 1;
            }
            return id;
        }
    }

    /// Returns `id` to the pool.
    ///
    /// Returns `false` if `id` was not allocated.
    pub fn free(&mut self, id: usize) -> bool {
        if !self.is_allocated(id) {
            return false;
        }
        let word = id / WORD_BITS;
        self.free[word] |= 1u64 << (id % WORD_BITS);
        if word < self.cursor {
            self.cursor = word;
        }
        true
    }

    /// Returns true if `id` is currently handed out.
    pub fn is_allocated(&self, id: usize) -> bool {
        self.free
            .get(id / WORD_BITS)
            .is_some_and(|&w| w & (1u64 << (id % WORD_BITS)) == 0)
    }

    /// Number of ids currently handed out.
    pub fn allocated_count(&self) -> usize {
        self.free.iter().map(|w| w.count_zeros() as usize).sum()
    }

    /// Number of ids the backing storage can describe.
    pub fn capacity(&self) -> usize {
        self.free.len() * WORD_BITS
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.alloc(), 0);
        assert_eq!(ids.alloc(), 1);
        assert_eq!(ids.alloc(), 2);
        assert_eq!(ids.allocated_count(), 3);
    }

    #[test]
    fn freed_id_is_reused_first() {
        let mut ids = IdAllocator::new();
        for _ in 0..5 {
            ids.alloc();
        }
        assert!(ids.free(1));
        assert_eq!(ids.alloc(), 1);
        assert_eq!(ids.alloc(), 5);
    }

    #[test]
    fn double_free_returns_false() {
        let mut ids = IdAllocator::new();
        let id = ids.alloc();
        assert!(ids.free(id));
        assert!(!ids.free(id));
        assert!(!ids.free(10_000));
    }

    #[test]
    fn grows_by_doubling() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.capacity(), 64);
        for expected in 0..64 {
            assert_eq!(ids.alloc(), expected);
        }
        assert_eq!(ids.alloc(), 64);
        assert_eq!(ids.capacity(), 128);
        for _ in 65..129 {
            ids.alloc();
        }
        assert_eq!(ids.capacity(), 256);
    }

    #[test]
    fn free_rewinds_cursor_across_words() {
        let mut ids = IdAllocator::new();
        for _ in 0..130 {
            ids.alloc();
        }
        ids.free(3);
        ids.free(70);
        assert_eq!(ids.alloc(), 3);
        assert_eq!(ids.alloc(), 70);
        assert_eq!(ids.alloc(), 130);
    }

    #[test]
    fn seeded_copy_keeps_allocated_ids() {
        let mut base = IdAllocator::new();
        base.alloc();
        base.alloc();
        let mut seeded = IdAllocator::seeded_from(&base);
        assert!(seeded.is_allocated(0));
        assert!(seeded.is_allocated(1));
        assert_eq!(seeded.alloc(), 2);
        // The copy is independent of its source.
        assert!(!base.is_allocated(2));
    }

    #[test]
    fn component_id_maps_onto_entity_space() {
        assert_eq!(ComponentId(7).as_entity(), Entity(7));
        assert_eq!(format!("{:?}", Entity(3)), "Entity(3)");
        assert_eq!(Entity(3).to_string(), "entity 3");
    }
}
