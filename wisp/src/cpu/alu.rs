//! The arithmetic logic unit. Every operation is a pure function that hands back the computed
//! value together with the flags it produced, so the CPU can decide per instruction which of
//! those flags actually land in F.

use crate::bits;
use crate::bits::Bit;

use super::Flag;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display,
)]
#[display("Flags(Z={} N={} H={} C={})", *z as u8, *n as u8, *h as u8, *c as u8)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The subtraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: value & Flag::Z.mask() != 0,
            n: value & Flag::N.mask() != 0,
            h: value & Flag::H.mask() != 0,
            c: value & Flag::C.mask() != 0,
        }
    }
}

impl Flags {
    pub const fn new(z: bool, n: bool, h: bool, c: bool) -> Self {
        Self { z, n, h, c }
    }

    /// The flags as they are laid out in the F register. The lower nibble is always zero.
    pub fn as_byte(&self) -> u8 {
        [
            (self.z, Flag::Z),
            (self.n, Flag::N),
            (self.h, Flag::H),
            (self.c, Flag::C),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(0, |acc, (_, flag)| acc | flag.mask())
    }
}

/// A value and the flags produced while computing it. Most operations only produce a byte, in
/// which case the upper half of `value` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("0x{value:0>4X} {flags}")]
pub struct AluResult {
    pub value: u16,
    pub flags: Flags,
}

impl AluResult {
    fn byte(value: u8, flags: Flags) -> Self {
        Self {
            value: value.into(),
            flags,
        }
    }

    /// The low byte of the value.
    pub fn value8(&self) -> u8 {
        self.value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotDir {
    Left,
    Right,
}

pub fn add(l: u8, r: u8) -> AluResult {
    add_with_carry(l, r, false)
}

pub fn add_with_carry(l: u8, r: u8, carry: bool) -> AluResult {
    let carry = u8::from(carry);
    let sum = u16::from(l) + u16::from(r) + u16::from(carry);
    let value = sum as u8;
    let h = (l & 0xF) + (r & 0xF) + carry > 0xF;
    AluResult::byte(value, Flags::new(value == 0, false, h, sum > 0xFF))
}

/// 16-bit addition whose H and C flags come from adding the low bytes.
pub fn add16_low(l: u16, r: u16) -> AluResult {
    let h = (l & 0xF) + (r & 0xF) > 0xF;
    let c = (l & 0xFF) + (r & 0xFF) > 0xFF;
    AluResult {
        value: l.wrapping_add(r),
        flags: Flags::new(false, false, h, c),
    }
}

/// 16-bit addition whose H and C flags come from adding the high bytes, including the carry out
/// of the low bytes.
pub fn add16_high(l: u16, r: u16) -> AluResult {
    let h = (l & 0xFFF) + (r & 0xFFF) > 0xFFF;
    let c = u32::from(l) + u32::from(r) > 0xFFFF;
    AluResult {
        value: l.wrapping_add(r),
        flags: Flags::new(false, false, h, c),
    }
}

pub fn sub(l: u8, r: u8) -> AluResult {
    sub_with_borrow(l, r, false)
}

pub fn sub_with_borrow(l: u8, r: u8, borrow: bool) -> AluResult {
    let borrow = u8::from(borrow);
    let value = l.wrapping_sub(r).wrapping_sub(borrow);
    let h = u16::from(l & 0xF) < u16::from(r & 0xF) + u16::from(borrow);
    let c = u16::from(l) < u16::from(r) + u16::from(borrow);
    AluResult::byte(value, Flags::new(value == 0, true, h, c))
}

/// Turns the result of a binary addition or subtraction of two BCD numbers back into BCD.
pub fn bcd_adjust(value: u8, n: bool, h: bool, c: bool) -> AluResult {
    let fix_low = h || (!n && value & 0xF > 9);
    let fix_high = c || (!n && value > 0x99);
    let fix = 0x60 * u8::from(fix_high) + 0x06 * u8::from(fix_low);
    let adjusted = if n {
        value.wrapping_sub(fix)
    } else {
        value.wrapping_add(fix)
    };
    AluResult::byte(adjusted, Flags::new(adjusted == 0, n, false, fix_high))
}

pub fn and(l: u8, r: u8) -> AluResult {
    let value = l & r;
    AluResult::byte(value, Flags::new(value == 0, false, true, false))
}

pub fn or(l: u8, r: u8) -> AluResult {
    let value = l | r;
    AluResult::byte(value, Flags::new(value == 0, false, false, false))
}

pub fn xor(l: u8, r: u8) -> AluResult {
    let value = l ^ r;
    AluResult::byte(value, Flags::new(value == 0, false, false, false))
}

fn shifted(value: u8, ejected: bool) -> AluResult {
    AluResult::byte(value, Flags::new(value == 0, false, false, ejected))
}

pub fn shift_left(value: u8) -> AluResult {
    shifted(value << 1, bits::test_bit(value, 7))
}

/// Shifts right while keeping the sign bit.
pub fn shift_right_arithmetic(value: u8) -> AluResult {
    shifted(((value as i8) >> 1) as u8, bits::test_bit(value, 0))
}

pub fn shift_right_logical(value: u8) -> AluResult {
    shifted(value >> 1, bits::test_bit(value, 0))
}

pub fn rotate(dir: RotDir, value: u8) -> AluResult {
    match dir {
        RotDir::Left => shifted(value.rotate_left(1), bits::test_bit(value, 7)),
        RotDir::Right => shifted(value.rotate_right(1), bits::test_bit(value, 0)),
    }
}

/// Rotates through the carry, treating it as a ninth bit.
pub fn rotate_through_carry(dir: RotDir, value: u8, carry: bool) -> AluResult {
    match dir {
        RotDir::Left => shifted(value << 1 | u8::from(carry), bits::test_bit(value, 7)),
        RotDir::Right => shifted(value >> 1 | u8::from(carry) << 7, bits::test_bit(value, 0)),
    }
}

pub fn swap(value: u8) -> AluResult {
    shifted(value.rotate_left(4), false)
}

/// The value of the result is always zero; only the flags carry information.
#[track_caller]
pub fn test_bit(value: u8, index: u8) -> AluResult {
    let set = bits::test_bit(value, index);
    AluResult::byte(0, Flags::new(!set, false, true, false))
}
