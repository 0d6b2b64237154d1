//! Bitmaps and Fenwick trees backing best-price discovery.
//!
//! [`LevelBitmap`] marks live price levels inside one bucket side and keeps
//! a Fenwick tree over its 64-bit words so the first or last live level is
//! found in `O(log n)`. [`BucketBitmap`] is the sparse counterpart over
//! signed bucket keys.

use std::collections::BTreeMap;

/// Binary indexed tree over signed 128-bit values.
///
/// Indices are zero-based for callers. `lower_bound` requires every stored
/// prefix to be non-negative, which holds for counts and open quantities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fenwick {
    tree: Vec<i128>,
}

impl Fenwick {
    /// Creates a tree of `len` zeroed slots.
    pub fn new(len: usize) -> Self {
        Self {
            tree: vec![0; len + 1],
        }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len() - 1
    }

    /// True when the tree has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `delta` to slot `index`.
    pub fn add(&mut self, index: usize, delta: i128) {
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum of slots `0..=index`.
    pub fn prefix_sum(&self, index: usize) -> i128 {
        let mut i = (index + 1).min(self.len());
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }

    /// Sum of slots `lo..=hi`, zero for an empty range.
    pub fn range_sum(&self, lo: usize, hi: usize) -> i128 {
        if lo > hi || self.is_empty() {
            return 0;
        }
        let upper = self.prefix_sum(hi);
        if lo == 0 {
            upper
        } else {
            upper - self.prefix_sum(lo - 1)
        }
    }

    /// Sum of every slot.
    #[inline]
    pub fn total(&self) -> i128 {
        if self.is_empty() {
            0
        } else {
            self.prefix_sum(self.len() - 1)
        }
    }

    /// Smallest index whose prefix sum reaches `target`.
    pub fn lower_bound(&self, target: i128) -> Option<usize> {
        if target <= 0 || self.total() < target {
            return None;
        }
        let mut pos = 0usize;
        let mut remaining = target;
        let mut step = self.len().next_power_of_two();
        while step > 0 {
            let next = pos + step;
            if next <= self.len() && self.tree[next] < remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        // pos is the count of slots strictly before the answer
        Some(pos)
    }
}

/// Existence bitmap over the price points of one bucket side.
///
/// Bits are set and cleared eagerly. The word-occupancy tree counts a word
/// only once it has been synchronized by a flush, so it may lag behind
/// freshly placed levels but never counts an empty word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelBitmap {
    words: Vec<u64>,
    synced: Vec<bool>,
    occupancy: Fenwick,
    set_bits: u32,
    points: u32,
}

impl LevelBitmap {
    /// Creates an empty bitmap covering `points` levels.
    pub fn new(points: u32) -> Self {
        let word_count = (points as usize).div_ceil(64).max(1);
        Self {
            words: vec![0; word_count],
            synced: vec![false; word_count],
            occupancy: Fenwick::new(word_count),
            set_bits: 0,
            points,
        }
    }

    /// Number of levels covered.
    #[inline]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// True when no level is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set_bits == 0
    }

    /// Number of live levels.
    #[inline]
    pub fn count(&self) -> u32 {
        self.set_bits
    }

    /// Whether level `index` is live.
    #[inline]
    pub fn is_set(&self, index: u32) -> bool {
        let (word, bit) = Self::split(index);
        self.words[word] & (1u64 << bit) != 0
    }

    /// Marks level `index` live. Returns false if it already was.
    pub fn set(&mut self, index: u32) -> bool {
        let (word, bit) = Self::split(index);
        let mask = 1u64 << bit;
        if self.words[word] & mask != 0 {
            return false;
        }
        self.words[word] |= mask;
        self.set_bits += 1;
        true
    }

    /// Marks level `index` dead, releasing its word from the occupancy
    /// tree once the word empties.
    pub fn clear(&mut self, index: u32) -> bool {
        let (word, bit) = Self::split(index);
        let mask = 1u64 << bit;
        if self.words[word] & mask == 0 {
            return false;
        }
        self.words[word] &= !mask;
        self.set_bits -= 1;
        if self.words[word] == 0 && self.synced[word] {
            self.synced[word] = false;
            self.occupancy.add(word, -1);
        }
        true
    }

    /// Brings the occupancy tree up to date for the word holding `index`.
    pub fn sync_word(&mut self, index: u32) {
        let (word, _) = Self::split(index);
        if self.words[word] != 0 && !self.synced[word] {
            self.synced[word] = true;
            self.occupancy.add(word, 1);
        }
    }

    /// Lowest live level according to the synchronized words.
    pub fn first(&self) -> Option<u32> {
        let word = self.occupancy.lower_bound(1)?;
        Some(Self::join(word, self.words[word].trailing_zeros()))
    }

    /// Highest live level according to the synchronized words.
    pub fn last(&self) -> Option<u32> {
        let word = self.occupancy.lower_bound(self.occupancy.total())?;
        Some(Self::join(word, 63 - self.words[word].leading_zeros()))
    }

    /// Lowest live level at or above `index`.
    pub fn next_at_or_after(&self, index: u32) -> Option<u32> {
        if index >= self.points {
            return None;
        }
        let (word, bit) = Self::split(index);
        let masked = self.words[word] & (u64::MAX << bit);
        if masked != 0 {
            return Some(Self::join(word, masked.trailing_zeros()));
        }
        let before = self.occupancy.prefix_sum(word);
        let next = self.occupancy.lower_bound(before + 1)?;
        Some(Self::join(next, self.words[next].trailing_zeros()))
    }

    /// Highest live level at or below `index`.
    pub fn prev_at_or_before(&self, index: u32) -> Option<u32> {
        let index = index.min(self.points.checked_sub(1)?);
        let (word, bit) = Self::split(index);
        let mask = if bit == 63 {
            u64::MAX
        } else {
            (1u64 << (bit + 1)) - 1
        };
        let masked = self.words[word] & mask;
        if masked != 0 {
            return Some(Self::join(word, 63 - masked.leading_zeros()));
        }
        if word == 0 {
            return None;
        }
        let before = self.occupancy.prefix_sum(word - 1);
        let prev = self.occupancy.lower_bound(before)?;
        Some(Self::join(prev, 63 - self.words[prev].leading_zeros()))
    }

    #[inline]
    fn split(index: u32) -> (usize, u32) {
        ((index / 64) as usize, index % 64)
    }

    #[inline]
    fn join(word: usize, bit: u32) -> u32 {
        word as u32 * 64 + bit
    }
}

/// Sparse bitmap over signed bucket keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketBitmap {
    words: BTreeMap<i32, u64>,
}

impl BucketBitmap {
    /// Creates an empty bitmap.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no bucket is marked.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `key` is marked.
    pub fn is_set(&self, key: i32) -> bool {
        let (word, bit) = Self::split(key);
        self.words
            .get(&word)
            .is_some_and(|bits| bits & (1u64 << bit) != 0)
    }

    /// Marks `key`.
    pub fn set(&mut self, key: i32) {
        let (word, bit) = Self::split(key);
        *self.words.entry(word).or_insert(0) |= 1u64 << bit;
    }

    /// Unmarks `key`, dropping the word when it empties.
    pub fn clear(&mut self, key: i32) {
        let (word, bit) = Self::split(key);
        if let Some(bits) = self.words.get_mut(&word) {
            *bits &= !(1u64 << bit);
            if *bits == 0 {
                self.words.remove(&word);
            }
        }
    }

    /// Lowest marked key.
    pub fn first(&self) -> Option<i32> {
        let (&word, &bits) = self.words.iter().next()?;
        Some(Self::join(word, bits.trailing_zeros()))
    }

    /// Highest marked key.
    pub fn last(&self) -> Option<i32> {
        let (&word, &bits) = self.words.iter().next_back()?;
        Some(Self::join(word, 63 - bits.leading_zeros()))
    }

    /// Lowest marked key at or above `key`.
    pub fn next_at_or_after(&self, key: i32) -> Option<i32> {
        let (word, bit) = Self::split(key);
        if let Some(&bits) = self.words.get(&word) {
            let masked = bits & (u64::MAX << bit);
            if masked != 0 {
                return Some(Self::join(word, masked.trailing_zeros()));
            }
        }
        let (&next, &bits) = self.words.range(word.checked_add(1)?..).next()?;
        Some(Self::join(next, bits.trailing_zeros()))
    }

    /// Highest marked key at or below `key`.
    pub fn prev_at_or_before(&self, key: i32) -> Option<i32> {
        let (word, bit) = Self::split(key);
        if let Some(&bits) = self.words.get(&word) {
            let mask = if bit == 63 {
                u64::MAX
            } else {
                (1u64 << (bit + 1)) - 1
            };
            let masked = bits & mask;
            if masked != 0 {
                return Some(Self::join(word, 63 - masked.leading_zeros()));
            }
        }
        let (&prev, &bits) = self.words.range(..word).next_back()?;
        Some(Self::join(prev, 63 - bits.leading_zeros()))
    }

    /// Iterates marked keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.words.iter().flat_map(|(&word, &bits)| {
            (0..64u32)
                .filter(move |bit| bits & (1u64 << bit) != 0)
                .map(move |bit| Self::join(word, bit))
        })
    }

    #[inline]
    fn split(key: i32) -> (i32, u32) {
        (key.div_euclid(64), key.rem_euclid(64) as u32)
    }

    #[inline]
    fn join(word: i32, bit: u32) -> i32 {
        word * 64 + bit as i32
    }
}
