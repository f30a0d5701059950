//! Small bit-twiddling helpers shared by the CPU and the LCD controller, plus the [`BitVector`]
//! that the pixel pipeline is built on.

mod vector;

pub use vector::*;

/// Anything that names a single bit of a byte. Flags, interrupts, and the various register bits
/// are all modelled as small enums that implement this.
pub trait Bit: Copy {
    /// The position of the bit, between 0 and 7.
    fn index(self) -> u8;

    fn mask(self) -> u8 {
        1 << self.index()
    }
}

/// `REVERSED[b]` holds `b` with its bit order mirrored.
static REVERSED: [u8; 0x100] = {
    let mut table = [0; 0x100];
    let mut i = 0;
    while i < 0x100 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
};

#[track_caller]
fn check_index(index: u8) {
    assert!(index < 8, "bit index {index} is out of range for a byte");
}

/// Checks if the given bit is set.
#[track_caller]
pub fn test_bit(value: u8, index: u8) -> bool {
    check_index(index);
    value & (1 << index) != 0
}

#[track_caller]
pub fn set_bit(value: u8, index: u8, on: bool) -> u8 {
    check_index(index);
    if on {
        value | (1 << index)
    } else {
        value & !(1 << index)
    }
}

/// Returns the `size` bits of `value` starting at `start`, moved down to bit 0.
#[track_caller]
pub fn extract(value: u8, start: u8, size: u8) -> u8 {
    assert!(
        start <= 8 && size <= 8 - start,
        "can not extract {size} bits starting at {start} from a byte"
    );
    if size == 0 {
        return 0;
    }
    (value >> start) & (u8::MAX >> (8 - size))
}

pub fn reverse8(value: u8) -> u8 {
    REVERSED[value as usize]
}

pub fn complement8(value: u8) -> u8 {
    !value
}

pub fn make16(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_table_matches_std() {
        assert_eq!(reverse8(0b1000_0000), 0b0000_0001);
        assert_eq!(reverse8(0b1100_1010), 0b0101_0011);
        (0..=u8::MAX).for_each(|b| assert_eq!(reverse8(reverse8(b)), b));
    }

    #[test]
    fn extract_middle_bits() {
        assert_eq!(extract(0b1011_0110, 3, 2), 0b10);
        assert_eq!(extract(0b1011_0110, 0, 8), 0b1011_0110);
        assert_eq!(extract(0b1011_0110, 8, 0), 0);
    }

    #[test]
    fn set_and_test() {
        let value = set_bit(0, 7, true);
        assert!(test_bit(value, 7));
        assert_eq!(set_bit(value, 7, false), 0);
        assert_eq!(make16(0x12, 0x34), 0x1234);
        assert_eq!(complement8(0x0F), 0xF0);
    }

    #[test]
    #[should_panic]
    fn bit_index_past_seven() {
        test_bit(0xFF, 8);
    }
}
