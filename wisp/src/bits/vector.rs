use std::fmt::Display;
use std::ops::BitAnd;
use std::ops::BitOr;
use std::ops::Not;

const WORD_BITS: usize = u32::BITS as usize;

/// A fixed-length bit array whose length is always a positive multiple of 32. Bit `i` lives in
/// bit `i % 32` of word `i / 32`, so index 0 is the least significant bit of the first word.
///
/// A single scanline is three of these (see [`LcdImageLine`](crate::lcd::LcdImageLine)), so
/// everything here works a whole word at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitVector {
    words: Box<[u32]>,
}

#[derive(Clone, Copy)]
enum Extension {
    Zero,
    Wrapped,
}

#[track_caller]
fn check_size(size: usize) {
    assert!(
        size > 0 && size % WORD_BITS == 0,
        "bit vector size must be a positive multiple of 32, got {size}"
    );
}

impl BitVector {
    /// A vector with every bit cleared.
    #[track_caller]
    pub fn new(size: usize) -> Self {
        Self::filled(size, false)
    }

    #[track_caller]
    pub fn filled(size: usize, value: bool) -> Self {
        check_size(size);
        let word = if value { u32::MAX } else { 0 };
        Self {
            words: vec![word; size / WORD_BITS].into(),
        }
    }

    pub fn size(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    #[track_caller]
    pub fn test_bit(&self, index: usize) -> bool {
        assert!(
            index < self.size(),
            "bit {index} is out of range for a vector of {} bits",
            self.size()
        );
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Extracts `size` bits beginning at `start` from the infinite zero-extension of this vector.
    #[track_caller]
    pub fn extract_zero_extended(&self, start: i32, size: usize) -> Self {
        self.extract(start, size, Extension::Zero)
    }

    /// Extracts `size` bits beginning at `start` from the infinite repetition of this vector.
    #[track_caller]
    pub fn extract_wrapped(&self, start: i32, size: usize) -> Self {
        self.extract(start, size, Extension::Wrapped)
    }

    /// Moves every bit `distance` positions towards the higher indices (a negative distance moves
    /// them down). Bits pushed past either end are lost and the gap is filled with zeros.
    pub fn shift(&self, distance: i32) -> Self {
        self.extract_zero_extended(distance.wrapping_neg(), self.size())
    }

    #[track_caller]
    fn extract(&self, start: i32, size: usize, ext: Extension) -> Self {
        check_size(size);
        let start = i64::from(start);
        let words = (0..size / WORD_BITS)
            .map(|i| self.word_at(start + (i * WORD_BITS) as i64, ext))
            .collect();
        Self { words }
    }

    /// The 32 bits starting at bit `start` of the extended vector.
    fn word_at(&self, start: i64, ext: Extension) -> u32 {
        let index = start.div_euclid(WORD_BITS as i64);
        let offset = start.rem_euclid(WORD_BITS as i64) as u32;
        if offset == 0 {
            self.word(index, ext)
        } else {
            (self.word(index, ext) >> offset) | (self.word(index + 1, ext) << (u32::BITS - offset))
        }
    }

    fn word(&self, index: i64, ext: Extension) -> u32 {
        let len = self.words.len() as i64;
        match ext {
            Extension::Wrapped => self.words[index.rem_euclid(len) as usize],
            Extension::Zero if (0..len).contains(&index) => self.words[index as usize],
            Extension::Zero => 0,
        }
    }

    fn zip_with(&self, other: &Self, op: impl Fn(u32, u32) -> u32) -> Self {
        assert_eq!(
            self.size(),
            other.size(),
            "bitwise operations need vectors of the same size"
        );
        let words = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(&a, &b)| op(a, b))
            .collect();
        Self { words }
    }

    #[track_caller]
    pub fn and(&self, other: &Self) -> Self {
        self.zip_with(other, BitAnd::bitand)
    }

    #[track_caller]
    pub fn or(&self, other: &Self) -> Self {
        self.zip_with(other, BitOr::bitor)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Self {
        Self {
            words: self.words.iter().map(|w| !w).collect(),
        }
    }
}

impl Not for &BitVector {
    type Output = BitVector;

    fn not(self) -> BitVector {
        BitVector::not(self)
    }
}

impl Not for BitVector {
    type Output = BitVector;

    fn not(mut self) -> BitVector {
        self.words.iter_mut().for_each(|w| *w = !*w);
        self
    }
}

impl BitAnd for &BitVector {
    type Output = BitVector;

    fn bitand(self, rhs: Self) -> BitVector {
        self.and(rhs)
    }
}

impl BitOr for &BitVector {
    type Output = BitVector;

    fn bitor(self, rhs: Self) -> BitVector {
        self.or(rhs)
    }
}

impl Display for BitVector {
    /// Most significant bit first, like a binary literal.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (0..self.size())
            .rev()
            .try_for_each(|i| write!(f, "{}", self.test_bit(i) as u8))
    }
}

/// Assembles a [`BitVector`] a byte at a time. Byte `i` covers bits `8 * i` through `8 * i + 7`.
#[derive(Debug, Clone)]
pub struct BitVectorBuilder {
    words: Vec<u32>,
}

impl BitVectorBuilder {
    #[track_caller]
    pub fn new(size: usize) -> Self {
        check_size(size);
        Self {
            words: vec![0; size / WORD_BITS],
        }
    }

    #[track_caller]
    pub fn set_byte(&mut self, index: usize, value: u8) -> &mut Self {
        let bytes = self.words.len() * 4;
        assert!(
            index < bytes,
            "byte {index} is out of range for a vector of {bytes} bytes"
        );
        let word = &mut self.words[index / 4];
        let shift = (index % 4) * 8;
        *word = (*word & !(0xFF << shift)) | (u32::from(value) << shift);
        self
    }

    pub fn build(self) -> BitVector {
        BitVector {
            words: self.words.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BitVector;
    use super::BitVectorBuilder;

    fn sample(size: usize) -> BitVector {
        let mut builder = BitVectorBuilder::new(size);
        (0..size / 8).for_each(|i| {
            builder.set_byte(i, (i as u8).wrapping_mul(37) ^ 0xA5);
        });
        builder.build()
    }

    #[test]
    fn builder_places_bytes_little_end_first() {
        let mut builder = BitVectorBuilder::new(64);
        builder.set_byte(0, 0b1111_0000).set_byte(7, 0b1000_0001);
        let v = builder.build();
        assert!(!v.test_bit(0));
        assert!(v.test_bit(4));
        assert!(v.test_bit(56));
        assert!(v.test_bit(63));
        assert!(!v.test_bit(62));
    }

    #[test]
    fn display_is_msb_first() {
        let mut builder = BitVectorBuilder::new(32);
        builder.set_byte(0, 0b1101);
        let v = builder.build();
        assert_eq!(
            v.to_string(),
            "00000000000000000000000000001101"
        );
    }

    #[test]
    fn logic_ops() {
        let all = BitVector::filled(64, true);
        let none = BitVector::new(64);
        assert_eq!(!&all, none);
        assert_eq!(&all & &none, none);
        assert_eq!(&all | &none, all);
        let v = sample(64);
        assert_eq!(&v | &!&v, all);
    }

    #[test]
    fn zero_extended_and_wrapped_agree_inside_the_vector() {
        for size in [32, 64, 96, 256] {
            let v = sample(size);
            for start in 0..=(size as i32 - 32) {
                for len in (32..=(size - start as usize)).step_by(32) {
                    assert_eq!(
                        v.extract_zero_extended(start, len),
                        v.extract_wrapped(start, len),
                        "size {size}, start {start}, len {len}"
                    );
                }
            }
        }
    }

    #[test]
    fn extraction_outside_the_vector() {
        let v = BitVector::filled(32, true);
        let zero = v.extract_zero_extended(-32, 64);
        assert!((0..32).all(|i| !zero.test_bit(i)));
        assert!((32..64).all(|i| zero.test_bit(i)));
        let wrapped = v.extract_wrapped(-17, 64);
        assert_eq!(wrapped, BitVector::filled(64, true));

        let v = sample(64);
        let wrapped = v.extract_wrapped(-8, 64);
        assert!((0..64).all(|i| wrapped.test_bit(i) == v.test_bit((i + 56) % 64)));
    }

    #[test]
    fn shifting() {
        let v = sample(64);
        let left = v.shift(5);
        assert!((0..5).all(|i| !left.test_bit(i)));
        assert!((5..64).all(|i| left.test_bit(i) == v.test_bit(i - 5)));
        let right = v.shift(-40);
        assert!((0..24).all(|i| right.test_bit(i) == v.test_bit(i + 40)));
        assert!((24..64).all(|i| !right.test_bit(i)));
        assert_eq!(v.shift(64), BitVector::new(64));
        assert_eq!(v.shift(0), v);
    }

    #[test]
    #[should_panic]
    fn size_must_be_word_multiple() {
        BitVector::new(48);
    }

    #[test]
    #[should_panic]
    fn mismatched_sizes() {
        let _ = &BitVector::new(32) & &BitVector::new(64);
    }

    #[test]
    #[should_panic]
    fn builder_byte_out_of_range() {
        BitVectorBuilder::new(32).set_byte(4, 0);
    }
}
