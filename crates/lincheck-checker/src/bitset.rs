//! Fixed-size membership bitset over operation ids.

const WORD_BITS: usize = u64::BITS as usize;

/// One bit per operation id; a set bit means the operation is part of the
/// candidate linearization. Two orderings of the same operations yield equal
/// bitsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
}

impl Bitset {
    /// Creates an empty bitset able to hold ids `0..bits`.
    pub fn new(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// Sets bit `pos`.
    #[inline]
    pub fn set(&mut self, pos: usize) {
        self.words[pos / WORD_BITS] |= 1 << (pos % WORD_BITS);
    }

    /// Clears bit `pos`.
    #[inline]
    pub fn clear(&mut self, pos: usize) {
        self.words[pos / WORD_BITS] &= !(1 << (pos % WORD_BITS));
    }

    /// Returns true if bit `pos` is set.
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        self.words[pos / WORD_BITS] & (1 << (pos % WORD_BITS)) != 0
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Bucketing key derived from the bit pattern.
    ///
    /// Equal bitsets always share a key; unequal ones may collide, so callers
    /// must still compare bitsets for equality.
    pub fn hash_key(&self) -> u64 {
        self.words
            .iter()
            .fold(self.count() as u64, |hash, word| hash ^ word)
    }
}
