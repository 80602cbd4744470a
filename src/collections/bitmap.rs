//! `Bitmap` — a packed boolean sequence over word-sized sections.
//!
//! Bits are packed into `usize` words held in a [`SectionedVec`]; the logical
//! bit length is tracked separately from the word count. Insert and remove
//! preserve bit order across word boundaries by rippling one carry bit per
//! word between the touched position and the tail. Bits at positions past
//! the logical length are padding: they may hold anything (removals leave
//! stale values behind), so every whole-bitmap operation bounds itself by
//! the length, never by the word width.

use crate::alloc::{default_allocator, RawAlloc, SystemAlloc};
use crate::error::{Error, Result};

use super::sectioned::SectionedVec;

/// Bits per storage word.
pub const WORD_BITS: usize = usize::BITS as usize;

/// Words per inner storage section, sized so a section spans 8 KiB of bits.
const WORDS_PER_SECTION: usize = 8 * super::sectioned::DEFAULT_SECTION_LEN / WORD_BITS;

/// Mask of the `bits` lowest bits of a word.
#[inline]
const fn low_mask(bits: usize) -> usize {
    if bits >= WORD_BITS {
        usize::MAX
    } else {
        (1usize << bits) - 1
    }
}

/// Inserts `value` at `bit`, shifting higher bits up; returns the MSB that
/// fell out of the word.
#[inline]
fn word_insert(word: &mut usize, bit: usize, value: bool) -> bool {
    let fell_out = *word >> (WORD_BITS - 1) == 1;
    let below = *word & low_mask(bit);
    let above = (*word & !low_mask(bit)) << 1;
    *word = below | above | ((value as usize) << bit);
    fell_out
}

/// Removes the bit at `bit`, shifting higher bits down and writing
/// `incoming` into the vacated MSB; returns the removed bit.
#[inline]
fn word_remove(word: &mut usize, bit: usize, incoming: bool) -> bool {
    let removed = (*word >> bit) & 1 == 1;
    let below = *word & low_mask(bit);
    let above = (*word & !low_mask(bit + 1)) >> 1;
    *word = below | above | ((incoming as usize) << (WORD_BITS - 1));
    removed
}

/// A dense, ordered bitmap of externally tracked length.
pub struct Bitmap<'a, A: RawAlloc + ?Sized = SystemAlloc> {
    words: SectionedVec<'a, usize, A>,
    len: usize,
}

impl<'a, A: RawAlloc + ?Sized> Bitmap<'a, A> {
    /// Creates a bitmap of `len` bits, all set to `value`.
    ///
    /// # Errors
    /// [`Error::Allocation`] if word storage cannot be obtained.
    pub fn new_in(len: usize, value: bool, alloc: &'a A) -> Result<Self> {
        let mut words = SectionedVec::with_section_len(WORDS_PER_SECTION, alloc)?;
        let fill = if value { usize::MAX } else { 0 };
        for _ in 0..len.div_ceil(WORD_BITS) {
            words.push(fill)?;
        }
        Ok(Self { words, len })
    }

    /// Number of bits.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap holds no bits.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the bit at `idx`.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx >= len`.
    #[inline]
    pub fn get(&self, idx: usize) -> Result<bool> {
        if idx >= self.len {
            return Err(Error::out_of_range(idx, self.len));
        }
        Ok((self.words[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1)
    }

    /// Writes the bit at `idx`, returning the previous value.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx >= len`.
    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) -> Result<bool> {
        if idx >= self.len {
            return Err(Error::out_of_range(idx, self.len));
        }
        let word = &mut self.words[idx / WORD_BITS];
        let mask = 1usize << (idx % WORD_BITS);
        let old = *word & mask != 0;
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
        Ok(old)
    }

    /// Returns a one-bit proxy for position `idx`.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx >= len`.
    pub fn bit(&mut self, idx: usize) -> Result<BitRef<'_>> {
        if idx >= self.len {
            return Err(Error::out_of_range(idx, self.len));
        }
        Ok(BitRef {
            word: &mut self.words[idx / WORD_BITS],
            bit: idx % WORD_BITS,
        })
    }

    /// Inserts `value` at `idx`, growing the bitmap by one bit.
    ///
    /// Bits at and above `idx` shift up by one; the MSB falling out of each
    /// word is front-inserted into the next, and a fresh zero word is
    /// appended first whenever the last used word is full.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx > len`; [`Error::Allocation`] if a word
    /// must be appended and cannot be.
    pub fn insert(&mut self, idx: usize, value: bool) -> Result<()> {
        if idx > self.len {
            return Err(Error::out_of_range(idx, self.len));
        }
        if self.words.len() * WORD_BITS == self.len {
            self.words.push(0)?;
        }

        let section = idx / WORD_BITS;
        let mut carried = word_insert(&mut self.words[section], idx % WORD_BITS, value);

        let used_words = self.len / WORD_BITS + 1;
        for k in section + 1..used_words {
            carried = word_insert(&mut self.words[k], 0, carried);
        }
        // Whatever fell out of the last used word was padding.
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the bit at `idx`, shrinking the bitmap by one.
    ///
    /// Bits above `idx` shift down by one: starting from the last used word,
    /// each word's LSB is pulled into the previous word's MSB. Whole words
    /// freed at the tail are released once the length lands on a word
    /// boundary.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `idx >= len`.
    pub fn remove(&mut self, idx: usize) -> Result<bool> {
        if idx >= self.len {
            return Err(Error::out_of_range(idx, self.len));
        }

        let section = idx / WORD_BITS;
        let used_words = self.len.div_ceil(WORD_BITS);

        let mut carried = false;
        for k in (section + 1..used_words).rev() {
            carried = word_remove(&mut self.words[k], 0, carried);
        }
        let removed = word_remove(&mut self.words[section], idx % WORD_BITS, carried);

        self.len -= 1;
        if self.len % WORD_BITS == 0 {
            while self.words.len() > self.len / WORD_BITS {
                let tail = self.words.len() - 1;
                self.words.remove(tail)?;
            }
        }
        Ok(removed)
    }

    /// Counts the bits equal to `value`.
    ///
    /// Full words go through the hardware popcount; the partial tail word is
    /// masked down to the live bits first, so padding never leaks in.
    #[must_use]
    pub fn count(&self, value: bool) -> usize {
        let full_words = self.len / WORD_BITS;
        let tail_bits = self.len % WORD_BITS;
        let mut ones = 0usize;
        for (wi, &word) in self.words.iter().enumerate() {
            let live = if wi < full_words {
                word
            } else {
                word & low_mask(tail_bits)
            };
            ones += live.count_ones() as usize;
        }
        if value {
            ones
        } else {
            self.len - ones
        }
    }

    /// Iterates over the positions of set bits, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        let full_words = self.len / WORD_BITS;
        let tail_bits = self.len % WORD_BITS;
        self.words.iter().enumerate().flat_map(move |(wi, &word)| {
            let live = if wi < full_words {
                word
            } else {
                word & low_mask(tail_bits)
            };
            OnesInWord {
                word: live,
                base: wi * WORD_BITS,
            }
        })
    }

    /// Drops every bit.
    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }
}

impl Bitmap<'static, SystemAlloc> {
    /// Creates a bitmap on the process-wide default allocator.
    ///
    /// # Errors
    /// [`Error::Allocation`] if word storage cannot be obtained.
    pub fn new(len: usize, value: bool) -> Result<Self> {
        Bitmap::new_in(len, value, default_allocator())
    }
}

impl<A: RawAlloc + ?Sized> core::fmt::Debug for Bitmap<'_, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Bitmap[{}; ", self.len)?;
        for i in 0..self.len {
            let bit = (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1;
            write!(f, "{bit}")?;
        }
        f.write_str("]")
    }
}

/// Yields the set-bit offsets of a single word, lowest first.
struct OnesInWord {
    word: usize,
    base: usize,
}

impl Iterator for OnesInWord {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let tz = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1; // clear lowest set bit
        Some(self.base + tz)
    }
}

/// A one-bit lvalue: a borrowed storage word plus a bit position.
///
/// Reads and writes go through masking; this is an explicit proxy, not an
/// emulation of `&bool`.
pub struct BitRef<'w> {
    word: &'w mut usize,
    bit: usize,
}

impl BitRef<'_> {
    /// Reads the bit.
    #[inline]
    #[must_use]
    pub fn get(&self) -> bool {
        (*self.word >> self.bit) & 1 == 1
    }

    /// Writes the bit, returning the previous value.
    #[inline]
    pub fn set(&mut self, value: bool) -> bool {
        let mask = 1usize << self.bit;
        let old = *self.word & mask != 0;
        if value {
            *self.word |= mask;
        } else {
            *self.word &= !mask;
        }
        old
    }
}

impl From<BitRef<'_>> for bool {
    #[inline]
    fn from(bit: BitRef<'_>) -> bool {
        bit.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::default_allocator;

    fn bits_of(b: &Bitmap<'_, SystemAlloc>) -> Vec<bool> {
        (0..b.len()).map(|i| b.get(i).unwrap()).collect()
    }

    #[test]
    fn new_filled() {
        let b = Bitmap::new(70, true).unwrap();
        assert_eq!(b.len(), 70);
        assert_eq!(b.count(true), 70);
        assert_eq!(b.count(false), 0);
    }

    #[test]
    fn set_and_get() {
        let mut b = Bitmap::new(130, false).unwrap();
        assert!(!b.set(0, true).unwrap());
        assert!(!b.set(64, true).unwrap());
        assert!(!b.set(129, true).unwrap());
        assert!(b.get(64).unwrap());
        assert!(b.set(64, false).unwrap());
        assert_eq!(b.count(true), 2);
        assert!(matches!(b.get(130), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn insert_shifts_across_word_boundary() {
        let mut b = Bitmap::new(WORD_BITS, false).unwrap();
        b.set(WORD_BITS - 1, true).unwrap();
        // Inserting at 0 pushes the MSB into a freshly appended word.
        b.insert(0, false).unwrap();
        assert_eq!(b.len(), WORD_BITS + 1);
        assert!(b.get(WORD_BITS).unwrap());
        assert!(!b.get(WORD_BITS - 1).unwrap());
    }

    #[test]
    fn insert_at_len_appends() {
        let mut b = Bitmap::new(3, false).unwrap();
        b.insert(3, true).unwrap();
        assert_eq!(bits_of(&b), vec![false, false, false, true]);
    }

    #[test]
    fn remove_shifts_down_across_words() {
        let mut b = Bitmap::new(WORD_BITS + 2, false).unwrap();
        b.set(WORD_BITS, true).unwrap();
        b.set(WORD_BITS + 1, true).unwrap();
        assert!(!b.remove(0).unwrap());
        assert_eq!(b.len(), WORD_BITS + 1);
        assert!(b.get(WORD_BITS - 1).unwrap());
        assert!(b.get(WORD_BITS).unwrap());
    }

    #[test]
    fn remove_releases_trailing_words() {
        let mut b = Bitmap::new(WORD_BITS + 1, true).unwrap();
        assert!(b.remove(WORD_BITS).unwrap());
        assert_eq!(b.len(), WORD_BITS);
        assert_eq!(b.count(true), WORD_BITS);
        // A second removal keeps working off the single remaining word.
        assert!(b.remove(0).unwrap());
        assert_eq!(b.count(true), WORD_BITS - 1);
    }

    #[test]
    fn insert_remove_round_trip() {
        let mut b = Bitmap::new(100, false).unwrap();
        for i in (0..100).step_by(7) {
            b.set(i, true).unwrap();
        }
        let before = bits_of(&b);
        for idx in [0, 50, 99, 100] {
            let idx = idx.min(b.len());
            b.insert(idx, true).unwrap();
            assert!(b.remove(idx).unwrap());
            assert_eq!(bits_of(&b), before, "round trip at {idx}");
        }
    }

    #[test]
    fn padding_never_counted() {
        // A non-word-multiple length whose padding got dirtied by removals.
        let mut b = Bitmap::new(WORD_BITS + 10, true).unwrap();
        for _ in 0..9 {
            b.remove(0).unwrap();
        }
        assert_eq!(b.len(), WORD_BITS + 1);
        assert_eq!(b.count(true), WORD_BITS + 1);
        assert_eq!(b.count(false), 0);
    }

    #[test]
    fn iter_ones_ascending() {
        let mut b = Bitmap::new(200, false).unwrap();
        let expect = [0usize, 1, 63, 64, 65, 127, 128, 199];
        for &i in &expect {
            b.set(i, true).unwrap();
        }
        let got: Vec<usize> = b.iter_ones().collect();
        assert_eq!(got, expect);
    }

    #[test]
    fn bit_proxy_reads_and_writes() {
        let mut b = Bitmap::new(80, false).unwrap();
        let mut bit = b.bit(70).unwrap();
        assert!(!bit.get());
        assert!(!bit.set(true));
        assert!(bool::from(b.bit(70).unwrap()));
        assert_eq!(b.count(true), 1);
    }

    #[test]
    fn empty_bitmap() {
        let mut b = Bitmap::new(0, false).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.count(true), 0);
        b.insert(0, true).unwrap();
        assert_eq!(b.len(), 1);
        assert!(b.get(0).unwrap());
    }

    #[test]
    fn alloc_aware_construction() {
        let b = Bitmap::new_in(10, false, default_allocator()).unwrap();
        assert_eq!(b.len(), 10);
    }
}
