//! # Bit Signatures — Which Components an Entity Has
//!
//! A [`BitSignature`] is a growable bit vector indexed by
//! [`ComponentId`](super::entity::ComponentId). The store keeps one per entity
//! (bit *i* set ⇔ the entity carries component *i*) and every system keeps one
//! describing what it requires. Matching is a single superset test:
//!
//! ```text
//! entity:  0b1011_0110
//! system:  0b0010_0110
//!          ───────────  entity ⊇ system  → candidate
//! ```
//!
//! ## Growth
//!
//! Words are `u64`. Setting a bit past the end grows the vector to the next
//! power-of-two word count, so signatures grown one component at a time only
//! reallocate a logarithmic number of times. Clearing a bit past the end is a
//! no-op. Missing words on either side of a comparison count as zero.

/// Growable bit vector used for entity signatures and system requirements.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitSignature {
    words: Vec<u64>,
}

impl BitSignature {
    /// Creates an empty signature.
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Builds a signature with every index in `indices` set.
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut sig = Self::new();
        for index in indices {
            sig.set(index, true);
        }
        sig
    }

    /// Sets or clears the bit at `index`, growing the storage when needed.
    pub fn set(&mut self, index: usize, value: bool) {
        let word = index / 64;
        let bit = index % 64;

        if word >= self.words.len() {
            if !value {
                return;
            }
            let needed = (word + 1).next_power_of_two();
            self.words.resize(needed, 0);
        }

        if value {
            self.words[word] |= 1u64 << bit;
        } else {
            self.words[word] &= !(1u64 << bit);
        }
    }

    /// Returns true if the bit at `index` is set.
    pub fn get(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|&w| w & (1u64 << (index % 64)) != 0)
    }

    /// True iff every bit set in `other` is also set in `self`.
    pub fn is_superset_of(&self, other: &BitSignature) -> bool {
        other.words.iter().enumerate().all(|(i, &theirs)| {
            let ours = self.words.get(i).copied().unwrap_or(0);
            theirs & !ours == 0
        })
    }

    /// Clears every bit. Capacity is kept.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of 64-bit words currently allocated.
    pub fn word_capacity(&self) -> usize {
        self.words.len()
    }

    /// Iterates the indices of set bits in ascending order.
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl std::fmt::Debug for BitSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}

/// Iterator over set-bit indices of a [`BitSignature`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                // Drop the lowest set bit.
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}
