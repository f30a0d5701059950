//! Instruction descriptors and the two 256-entry dispatch tables built from them.

use std::sync::LazyLock;

/// The byte that tells the CPU to decode the following byte with the prefixed table.
pub const PREFIX: u8 = 0xCB;

/// Which table an opcode lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Kind {
    Direct,
    Prefixed,
}

/// Instruction families. Opcodes in the same family share an implementation and only differ by
/// the operands encoded in their low bits.
///
/// Naming: `R8`/`R16` are registers, `Hlr` is the byte at `(HL)`, `Hlru` is `(HL)` followed by an
/// increment or decrement, `N8`/`N16`/`E8`/`S8` are immediates, a trailing `r` means "the byte at",
/// and `Sp` in a pair family means the fourth pair slot selects SP rather than AF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Nop,
    LdR8Hlr,
    LdAHlru,
    LdAN8r,
    LdACr,
    LdAN16r,
    LdABcr,
    LdADer,
    LdR8N8,
    LdR16SpN16,
    PopR16,
    LdHlrR8,
    LdHlruA,
    LdN8rA,
    LdCrA,
    LdN16rA,
    LdBcrA,
    LdDerA,
    LdHlrN8,
    LdN16rSp,
    LdR8R8,
    LdSpHl,
    PushR16,
    AddAR8,
    AddAN8,
    AddAHlr,
    IncR8,
    IncHlr,
    IncR16Sp,
    AddHlR16Sp,
    LdHlSpS8,
    SubAR8,
    SubAN8,
    SubAHlr,
    DecR8,
    DecHlr,
    CpAR8,
    CpAN8,
    CpAHlr,
    DecR16Sp,
    AndAN8,
    AndAR8,
    AndAHlr,
    OrAR8,
    OrAN8,
    OrAHlr,
    XorAR8,
    XorAN8,
    XorAHlr,
    Cpl,
    Rotca,
    Rota,
    RotcR8,
    RotR8,
    RotcHlr,
    RotHlr,
    SwapR8,
    SwapHlr,
    SlaR8,
    SraR8,
    SrlR8,
    SlaHlr,
    SraHlr,
    SrlHlr,
    BitU3R8,
    BitU3Hlr,
    ChgU3R8,
    ChgU3Hlr,
    Daa,
    Sccf,
    JpHl,
    JpN16,
    JpCcN16,
    JrE8,
    JrCcE8,
    CallN16,
    CallCcN16,
    RstU3,
    Ret,
    RetCc,
    Edi,
    Reti,
    Halt,
    Stop,
}

/// Describes a single encoding. Cycle counts are in machine cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{family:?} (0x{encoding:0>2X})")]
pub struct Opcode {
    pub kind: Kind,
    pub family: Family,
    pub encoding: u8,
    /// Includes the prefix byte for prefixed opcodes.
    pub total_bytes: u8,
    pub cycles: u8,
    /// Only paid when a conditional branch is taken.
    pub additional_cycles: u8,
}

const fn direct(encoding: u8, family: Family, total_bytes: u8, cycles: u8) -> Opcode {
    branch(encoding, family, total_bytes, cycles, 0)
}

const fn branch(
    encoding: u8,
    family: Family,
    total_bytes: u8,
    cycles: u8,
    additional_cycles: u8,
) -> Opcode {
    Opcode {
        kind: Kind::Direct,
        family,
        encoding,
        total_bytes,
        cycles,
        additional_cycles,
    }
}

const fn prefixed(encoding: u8, family: Family, cycles: u8) -> Opcode {
    Opcode {
        kind: Kind::Prefixed,
        family,
        encoding,
        total_bytes: 2,
        cycles,
        additional_cycles: 0,
    }
}

use Family::*;

#[rustfmt::skip]
static DIRECT_OPS: &[Opcode] = &[
    direct(0x00, Nop, 1, 1),
    direct(0x01, LdR16SpN16, 3, 3),
    direct(0x02, LdBcrA, 1, 2),
    direct(0x03, IncR16Sp, 1, 2),
    direct(0x04, IncR8, 1, 1),
    direct(0x05, DecR8, 1, 1),
    direct(0x06, LdR8N8, 2, 2),
    direct(0x07, Rotca, 1, 1),
    direct(0x08, LdN16rSp, 3, 5),
    direct(0x09, AddHlR16Sp, 1, 2),
    direct(0x0A, LdABcr, 1, 2),
    direct(0x0B, DecR16Sp, 1, 2),
    direct(0x0C, IncR8, 1, 1),
    direct(0x0D, DecR8, 1, 1),
    direct(0x0E, LdR8N8, 2, 2),
    direct(0x0F, Rotca, 1, 1),
    direct(0x10, Stop, 2, 1),
    direct(0x11, LdR16SpN16, 3, 3),
    direct(0x12, LdDerA, 1, 2),
    direct(0x13, IncR16Sp, 1, 2),
    direct(0x14, IncR8, 1, 1),
    direct(0x15, DecR8, 1, 1),
    direct(0x16, LdR8N8, 2, 2),
    direct(0x17, Rota, 1, 1),
    direct(0x18, JrE8, 2, 3),
    direct(0x19, AddHlR16Sp, 1, 2),
    direct(0x1A, LdADer, 1, 2),
    direct(0x1B, DecR16Sp, 1, 2),
    direct(0x1C, IncR8, 1, 1),
    direct(0x1D, DecR8, 1, 1),
    direct(0x1E, LdR8N8, 2, 2),
    direct(0x1F, Rota, 1, 1),
    branch(0x20, JrCcE8, 2, 2, 1),
    direct(0x21, LdR16SpN16, 3, 3),
    direct(0x22, LdHlruA, 1, 2),
    direct(0x23, IncR16Sp, 1, 2),
    direct(0x24, IncR8, 1, 1),
    direct(0x25, DecR8, 1, 1),
    direct(0x26, LdR8N8, 2, 2),
    direct(0x27, Daa, 1, 1),
    branch(0x28, JrCcE8, 2, 2, 1),
    direct(0x29, AddHlR16Sp, 1, 2),
    direct(0x2A, LdAHlru, 1, 2),
    direct(0x2B, DecR16Sp, 1, 2),
    direct(0x2C, IncR8, 1, 1),
    direct(0x2D, DecR8, 1, 1),
    direct(0x2E, LdR8N8, 2, 2),
    direct(0x2F, Cpl, 1, 1),
    branch(0x30, JrCcE8, 2, 2, 1),
    direct(0x31, LdR16SpN16, 3, 3),
    direct(0x32, LdHlruA, 1, 2),
    direct(0x33, IncR16Sp, 1, 2),
    direct(0x34, IncHlr, 1, 3),
    direct(0x35, DecHlr, 1, 3),
    direct(0x36, LdHlrN8, 2, 3),
    direct(0x37, Sccf, 1, 1),
    branch(0x38, JrCcE8, 2, 2, 1),
    direct(0x39, AddHlR16Sp, 1, 2),
    direct(0x3A, LdAHlru, 1, 2),
    direct(0x3B, DecR16Sp, 1, 2),
    direct(0x3C, IncR8, 1, 1),
    direct(0x3D, DecR8, 1, 1),
    direct(0x3E, LdR8N8, 2, 2),
    direct(0x3F, Sccf, 1, 1),
    direct(0x40, LdR8R8, 1, 1),
    direct(0x41, LdR8R8, 1, 1),
    direct(0x42, LdR8R8, 1, 1),
    direct(0x43, LdR8R8, 1, 1),
    direct(0x44, LdR8R8, 1, 1),
    direct(0x45, LdR8R8, 1, 1),
    direct(0x46, LdR8Hlr, 1, 2),
    direct(0x47, LdR8R8, 1, 1),
    direct(0x48, LdR8R8, 1, 1),
    direct(0x49, LdR8R8, 1, 1),
    direct(0x4A, LdR8R8, 1, 1),
    direct(0x4B, LdR8R8, 1, 1),
    direct(0x4C, LdR8R8, 1, 1),
    direct(0x4D, LdR8R8, 1, 1),
    direct(0x4E, LdR8Hlr, 1, 2),
    direct(0x4F, LdR8R8, 1, 1),
    direct(0x50, LdR8R8, 1, 1),
    direct(0x51, LdR8R8, 1, 1),
    direct(0x52, LdR8R8, 1, 1),
    direct(0x53, LdR8R8, 1, 1),
    direct(0x54, LdR8R8, 1, 1),
    direct(0x55, LdR8R8, 1, 1),
    direct(0x56, LdR8Hlr, 1, 2),
    direct(0x57, LdR8R8, 1, 1),
    direct(0x58, LdR8R8, 1, 1),
    direct(0x59, LdR8R8, 1, 1),
    direct(0x5A, LdR8R8, 1, 1),
    direct(0x5B, LdR8R8, 1, 1),
    direct(0x5C, LdR8R8, 1, 1),
    direct(0x5D, LdR8R8, 1, 1),
    direct(0x5E, LdR8Hlr, 1, 2),
    direct(0x5F, LdR8R8, 1, 1),
    direct(0x60, LdR8R8, 1, 1),
    direct(0x61, LdR8R8, 1, 1),
    direct(0x62, LdR8R8, 1, 1),
    direct(0x63, LdR8R8, 1, 1),
    direct(0x64, LdR8R8, 1, 1),
    direct(0x65, LdR8R8, 1, 1),
    direct(0x66, LdR8Hlr, 1, 2),
    direct(0x67, LdR8R8, 1, 1),
    direct(0x68, LdR8R8, 1, 1),
    direct(0x69, LdR8R8, 1, 1),
    direct(0x6A, LdR8R8, 1, 1),
    direct(0x6B, LdR8R8, 1, 1),
    direct(0x6C, LdR8R8, 1, 1),
    direct(0x6D, LdR8R8, 1, 1),
    direct(0x6E, LdR8Hlr, 1, 2),
    direct(0x6F, LdR8R8, 1, 1),
    direct(0x70, LdHlrR8, 1, 2),
    direct(0x71, LdHlrR8, 1, 2),
    direct(0x72, LdHlrR8, 1, 2),
    direct(0x73, LdHlrR8, 1, 2),
    direct(0x74, LdHlrR8, 1, 2),
    direct(0x75, LdHlrR8, 1, 2),
    direct(0x76, Halt, 1, 1),
    direct(0x77, LdHlrR8, 1, 2),
    direct(0x78, LdR8R8, 1, 1),
    direct(0x79, LdR8R8, 1, 1),
    direct(0x7A, LdR8R8, 1, 1),
    direct(0x7B, LdR8R8, 1, 1),
    direct(0x7C, LdR8R8, 1, 1),
    direct(0x7D, LdR8R8, 1, 1),
    direct(0x7E, LdR8Hlr, 1, 2),
    direct(0x7F, LdR8R8, 1, 1),
    direct(0x80, AddAR8, 1, 1),
    direct(0x81, AddAR8, 1, 1),
    direct(0x82, AddAR8, 1, 1),
    direct(0x83, AddAR8, 1, 1),
    direct(0x84, AddAR8, 1, 1),
    direct(0x85, AddAR8, 1, 1),
    direct(0x86, AddAHlr, 1, 2),
    direct(0x87, AddAR8, 1, 1),
    direct(0x88, AddAR8, 1, 1),
    direct(0x89, AddAR8, 1, 1),
    direct(0x8A, AddAR8, 1, 1),
    direct(0x8B, AddAR8, 1, 1),
    direct(0x8C, AddAR8, 1, 1),
    direct(0x8D, AddAR8, 1, 1),
    direct(0x8E, AddAHlr, 1, 2),
    direct(0x8F, AddAR8, 1, 1),
    direct(0x90, SubAR8, 1, 1),
    direct(0x91, SubAR8, 1, 1),
    direct(0x92, SubAR8, 1, 1),
    direct(0x93, SubAR8, 1, 1),
    direct(0x94, SubAR8, 1, 1),
    direct(0x95, SubAR8, 1, 1),
    direct(0x96, SubAHlr, 1, 2),
    direct(0x97, SubAR8, 1, 1),
    direct(0x98, SubAR8, 1, 1),
    direct(0x99, SubAR8, 1, 1),
    direct(0x9A, SubAR8, 1, 1),
    direct(0x9B, SubAR8, 1, 1),
    direct(0x9C, SubAR8, 1, 1),
    direct(0x9D, SubAR8, 1, 1),
    direct(0x9E, SubAHlr, 1, 2),
    direct(0x9F, SubAR8, 1, 1),
    direct(0xA0, AndAR8, 1, 1),
    direct(0xA1, AndAR8, 1, 1),
    direct(0xA2, AndAR8, 1, 1),
    direct(0xA3, AndAR8, 1, 1),
    direct(0xA4, AndAR8, 1, 1),
    direct(0xA5, AndAR8, 1, 1),
    direct(0xA6, AndAHlr, 1, 2),
    direct(0xA7, AndAR8, 1, 1),
    direct(0xA8, XorAR8, 1, 1),
    direct(0xA9, XorAR8, 1, 1),
    direct(0xAA, XorAR8, 1, 1),
    direct(0xAB, XorAR8, 1, 1),
    direct(0xAC, XorAR8, 1, 1),
    direct(0xAD, XorAR8, 1, 1),
    direct(0xAE, XorAHlr, 1, 2),
    direct(0xAF, XorAR8, 1, 1),
    direct(0xB0, OrAR8, 1, 1),
    direct(0xB1, OrAR8, 1, 1),
    direct(0xB2, OrAR8, 1, 1),
    direct(0xB3, OrAR8, 1, 1),
    direct(0xB4, OrAR8, 1, 1),
    direct(0xB5, OrAR8, 1, 1),
    direct(0xB6, OrAHlr, 1, 2),
    direct(0xB7, OrAR8, 1, 1),
    direct(0xB8, CpAR8, 1, 1),
    direct(0xB9, CpAR8, 1, 1),
    direct(0xBA, CpAR8, 1, 1),
    direct(0xBB, CpAR8, 1, 1),
    direct(0xBC, CpAR8, 1, 1),
    direct(0xBD, CpAR8, 1, 1),
    direct(0xBE, CpAHlr, 1, 2),
    direct(0xBF, CpAR8, 1, 1),
    branch(0xC0, RetCc, 1, 2, 3),
    direct(0xC1, PopR16, 1, 3),
    branch(0xC2, JpCcN16, 3, 3, 1),
    direct(0xC3, JpN16, 3, 4),
    branch(0xC4, CallCcN16, 3, 3, 3),
    direct(0xC5, PushR16, 1, 4),
    direct(0xC6, AddAN8, 2, 2),
    direct(0xC7, RstU3, 1, 4),
    branch(0xC8, RetCc, 1, 2, 3),
    direct(0xC9, Ret, 1, 4),
    branch(0xCA, JpCcN16, 3, 3, 1),
    branch(0xCC, CallCcN16, 3, 3, 3),
    direct(0xCD, CallN16, 3, 6),
    direct(0xCE, AddAN8, 2, 2),
    direct(0xCF, RstU3, 1, 4),
    branch(0xD0, RetCc, 1, 2, 3),
    direct(0xD1, PopR16, 1, 3),
    branch(0xD2, JpCcN16, 3, 3, 1),
    branch(0xD4, CallCcN16, 3, 3, 3),
    direct(0xD5, PushR16, 1, 4),
    direct(0xD6, SubAN8, 2, 2),
    direct(0xD7, RstU3, 1, 4),
    branch(0xD8, RetCc, 1, 2, 3),
    direct(0xD9, Reti, 1, 4),
    branch(0xDA, JpCcN16, 3, 3, 1),
    branch(0xDC, CallCcN16, 3, 3, 3),
    direct(0xDE, SubAN8, 2, 2),
    direct(0xDF, RstU3, 1, 4),
    direct(0xE0, LdN8rA, 2, 3),
    direct(0xE1, PopR16, 1, 3),
    direct(0xE2, LdCrA, 1, 2),
    direct(0xE5, PushR16, 1, 4),
    direct(0xE6, AndAN8, 2, 2),
    direct(0xE7, RstU3, 1, 4),
    direct(0xE8, LdHlSpS8, 2, 4),
    direct(0xE9, JpHl, 1, 1),
    direct(0xEA, LdN16rA, 3, 4),
    direct(0xEE, XorAN8, 2, 2),
    direct(0xEF, RstU3, 1, 4),
    direct(0xF0, LdAN8r, 2, 3),
    direct(0xF1, PopR16, 1, 3),
    direct(0xF2, LdACr, 1, 2),
    direct(0xF3, Edi, 1, 1),
    direct(0xF5, PushR16, 1, 4),
    direct(0xF6, OrAN8, 2, 2),
    direct(0xF7, RstU3, 1, 4),
    direct(0xF8, LdHlSpS8, 2, 3),
    direct(0xF9, LdSpHl, 1, 2),
    direct(0xFA, LdAN16r, 3, 4),
    direct(0xFB, Edi, 1, 1),
    direct(0xFE, CpAN8, 2, 2),
    direct(0xFF, RstU3, 1, 4),
];

#[rustfmt::skip]
static PREFIXED_OPS: &[Opcode] = &[
    prefixed(0x00, RotcR8, 2),
    prefixed(0x01, RotcR8, 2),
    prefixed(0x02, RotcR8, 2),
    prefixed(0x03, RotcR8, 2),
    prefixed(0x04, RotcR8, 2),
    prefixed(0x05, RotcR8, 2),
    prefixed(0x06, RotcHlr, 4),
    prefixed(0x07, RotcR8, 2),
    prefixed(0x08, RotcR8, 2),
    prefixed(0x09, RotcR8, 2),
    prefixed(0x0A, RotcR8, 2),
    prefixed(0x0B, RotcR8, 2),
    prefixed(0x0C, RotcR8, 2),
    prefixed(0x0D, RotcR8, 2),
    prefixed(0x0E, RotcHlr, 4),
    prefixed(0x0F, RotcR8, 2),
    prefixed(0x10, RotR8, 2),
    prefixed(0x11, RotR8, 2),
    prefixed(0x12, RotR8, 2),
    prefixed(0x13, RotR8, 2),
    prefixed(0x14, RotR8, 2),
    prefixed(0x15, RotR8, 2),
    prefixed(0x16, RotHlr, 4),
    prefixed(0x17, RotR8, 2),
    prefixed(0x18, RotR8, 2),
    prefixed(0x19, RotR8, 2),
    prefixed(0x1A, RotR8, 2),
    prefixed(0x1B, RotR8, 2),
    prefixed(0x1C, RotR8, 2),
    prefixed(0x1D, RotR8, 2),
    prefixed(0x1E, RotHlr, 4),
    prefixed(0x1F, RotR8, 2),
    prefixed(0x20, SlaR8, 2),
    prefixed(0x21, SlaR8, 2),
    prefixed(0x22, SlaR8, 2),
    prefixed(0x23, SlaR8, 2),
    prefixed(0x24, SlaR8, 2),
    prefixed(0x25, SlaR8, 2),
    prefixed(0x26, SlaHlr, 4),
    prefixed(0x27, SlaR8, 2),
    prefixed(0x28, SraR8, 2),
    prefixed(0x29, SraR8, 2),
    prefixed(0x2A, SraR8, 2),
    prefixed(0x2B, SraR8, 2),
    prefixed(0x2C, SraR8, 2),
    prefixed(0x2D, SraR8, 2),
    prefixed(0x2E, SraHlr, 4),
    prefixed(0x2F, SraR8, 2),
    prefixed(0x30, SwapR8, 2),
    prefixed(0x31, SwapR8, 2),
    prefixed(0x32, SwapR8, 2),
    prefixed(0x33, SwapR8, 2),
    prefixed(0x34, SwapR8, 2),
    prefixed(0x35, SwapR8, 2),
    prefixed(0x36, SwapHlr, 4),
    prefixed(0x37, SwapR8, 2),
    prefixed(0x38, SrlR8, 2),
    prefixed(0x39, SrlR8, 2),
    prefixed(0x3A, SrlR8, 2),
    prefixed(0x3B, SrlR8, 2),
    prefixed(0x3C, SrlR8, 2),
    prefixed(0x3D, SrlR8, 2),
    prefixed(0x3E, SrlHlr, 4),
    prefixed(0x3F, SrlR8, 2),
    prefixed(0x40, BitU3R8, 2),
    prefixed(0x41, BitU3R8, 2),
    prefixed(0x42, BitU3R8, 2),
    prefixed(0x43, BitU3R8, 2),
    prefixed(0x44, BitU3R8, 2),
    prefixed(0x45, BitU3R8, 2),
    prefixed(0x46, BitU3Hlr, 3),
    prefixed(0x47, BitU3R8, 2),
    prefixed(0x48, BitU3R8, 2),
    prefixed(0x49, BitU3R8, 2),
    prefixed(0x4A, BitU3R8, 2),
    prefixed(0x4B, BitU3R8, 2),
    prefixed(0x4C, BitU3R8, 2),
    prefixed(0x4D, BitU3R8, 2),
    prefixed(0x4E, BitU3Hlr, 3),
    prefixed(0x4F, BitU3R8, 2),
    prefixed(0x50, BitU3R8, 2),
    prefixed(0x51, BitU3R8, 2),
    prefixed(0x52, BitU3R8, 2),
    prefixed(0x53, BitU3R8, 2),
    prefixed(0x54, BitU3R8, 2),
    prefixed(0x55, BitU3R8, 2),
    prefixed(0x56, BitU3Hlr, 3),
    prefixed(0x57, BitU3R8, 2),
    prefixed(0x58, BitU3R8, 2),
    prefixed(0x59, BitU3R8, 2),
    prefixed(0x5A, BitU3R8, 2),
    prefixed(0x5B, BitU3R8, 2),
    prefixed(0x5C, BitU3R8, 2),
    prefixed(0x5D, BitU3R8, 2),
    prefixed(0x5E, BitU3Hlr, 3),
    prefixed(0x5F, BitU3R8, 2),
    prefixed(0x60, BitU3R8, 2),
    prefixed(0x61, BitU3R8, 2),
    prefixed(0x62, BitU3R8, 2),
    prefixed(0x63, BitU3R8, 2),
    prefixed(0x64, BitU3R8, 2),
    prefixed(0x65, BitU3R8, 2),
    prefixed(0x66, BitU3Hlr, 3),
    prefixed(0x67, BitU3R8, 2),
    prefixed(0x68, BitU3R8, 2),
    prefixed(0x69, BitU3R8, 2),
    prefixed(0x6A, BitU3R8, 2),
    prefixed(0x6B, BitU3R8, 2),
    prefixed(0x6C, BitU3R8, 2),
    prefixed(0x6D, BitU3R8, 2),
    prefixed(0x6E, BitU3Hlr, 3),
    prefixed(0x6F, BitU3R8, 2),
    prefixed(0x70, BitU3R8, 2),
    prefixed(0x71, BitU3R8, 2),
    prefixed(0x72, BitU3R8, 2),
    prefixed(0x73, BitU3R8, 2),
    prefixed(0x74, BitU3R8, 2),
    prefixed(0x75, BitU3R8, 2),
    prefixed(0x76, BitU3Hlr, 3),
    prefixed(0x77, BitU3R8, 2),
    prefixed(0x78, BitU3R8, 2),
    prefixed(0x79, BitU3R8, 2),
    prefixed(0x7A, BitU3R8, 2),
    prefixed(0x7B, BitU3R8, 2),
    prefixed(0x7C, BitU3R8, 2),
    prefixed(0x7D, BitU3R8, 2),
    prefixed(0x7E, BitU3Hlr, 3),
    prefixed(0x7F, BitU3R8, 2),
    prefixed(0x80, ChgU3R8, 2),
    prefixed(0x81, ChgU3R8, 2),
    prefixed(0x82, ChgU3R8, 2),
    prefixed(0x83, ChgU3R8, 2),
    prefixed(0x84, ChgU3R8, 2),
    prefixed(0x85, ChgU3R8, 2),
    prefixed(0x86, ChgU3Hlr, 4),
    prefixed(0x87, ChgU3R8, 2),
    prefixed(0x88, ChgU3R8, 2),
    prefixed(0x89, ChgU3R8, 2),
    prefixed(0x8A, ChgU3R8, 2),
    prefixed(0x8B, ChgU3R8, 2),
    prefixed(0x8C, ChgU3R8, 2),
    prefixed(0x8D, ChgU3R8, 2),
    prefixed(0x8E, ChgU3Hlr, 4),
    prefixed(0x8F, ChgU3R8, 2),
    prefixed(0x90, ChgU3R8, 2),
    prefixed(0x91, ChgU3R8, 2),
    prefixed(0x92, ChgU3R8, 2),
    prefixed(0x93, ChgU3R8, 2),
    prefixed(0x94, ChgU3R8, 2),
    prefixed(0x95, ChgU3R8, 2),
    prefixed(0x96, ChgU3Hlr, 4),
    prefixed(0x97, ChgU3R8, 2),
    prefixed(0x98, ChgU3R8, 2),
    prefixed(0x99, ChgU3R8, 2),
    prefixed(0x9A, ChgU3R8, 2),
    prefixed(0x9B, ChgU3R8, 2),
    prefixed(0x9C, ChgU3R8, 2),
    prefixed(0x9D, ChgU3R8, 2),
    prefixed(0x9E, ChgU3Hlr, 4),
    prefixed(0x9F, ChgU3R8, 2),
    prefixed(0xA0, ChgU3R8, 2),
    prefixed(0xA1, ChgU3R8, 2),
    prefixed(0xA2, ChgU3R8, 2),
    prefixed(0xA3, ChgU3R8, 2),
    prefixed(0xA4, ChgU3R8, 2),
    prefixed(0xA5, ChgU3R8, 2),
    prefixed(0xA6, ChgU3Hlr, 4),
    prefixed(0xA7, ChgU3R8, 2),
    prefixed(0xA8, ChgU3R8, 2),
    prefixed(0xA9, ChgU3R8, 2),
    prefixed(0xAA, ChgU3R8, 2),
    prefixed(0xAB, ChgU3R8, 2),
    prefixed(0xAC, ChgU3R8, 2),
    prefixed(0xAD, ChgU3R8, 2),
    prefixed(0xAE, ChgU3Hlr, 4),
    prefixed(0xAF, ChgU3R8, 2),
    prefixed(0xB0, ChgU3R8, 2),
    prefixed(0xB1, ChgU3R8, 2),
    prefixed(0xB2, ChgU3R8, 2),
    prefixed(0xB3, ChgU3R8, 2),
    prefixed(0xB4, ChgU3R8, 2),
    prefixed(0xB5, ChgU3R8, 2),
    prefixed(0xB6, ChgU3Hlr, 4),
    prefixed(0xB7, ChgU3R8, 2),
    prefixed(0xB8, ChgU3R8, 2),
    prefixed(0xB9, ChgU3R8, 2),
    prefixed(0xBA, ChgU3R8, 2),
    prefixed(0xBB, ChgU3R8, 2),
    prefixed(0xBC, ChgU3R8, 2),
    prefixed(0xBD, ChgU3R8, 2),
    prefixed(0xBE, ChgU3Hlr, 4),
    prefixed(0xBF, ChgU3R8, 2),
    prefixed(0xC0, ChgU3R8, 2),
    prefixed(0xC1, ChgU3R8, 2),
    prefixed(0xC2, ChgU3R8, 2),
    prefixed(0xC3, ChgU3R8, 2),
    prefixed(0xC4, ChgU3R8, 2),
    prefixed(0xC5, ChgU3R8, 2),
    prefixed(0xC6, ChgU3Hlr, 4),
    prefixed(0xC7, ChgU3R8, 2),
    prefixed(0xC8, ChgU3R8, 2),
    prefixed(0xC9, ChgU3R8, 2),
    prefixed(0xCA, ChgU3R8, 2),
    prefixed(0xCB, ChgU3R8, 2),
    prefixed(0xCC, ChgU3R8, 2),
    prefixed(0xCD, ChgU3R8, 2),
    prefixed(0xCE, ChgU3Hlr, 4),
    prefixed(0xCF, ChgU3R8, 2),
    prefixed(0xD0, ChgU3R8, 2),
    prefixed(0xD1, ChgU3R8, 2),
    prefixed(0xD2, ChgU3R8, 2),
    prefixed(0xD3, ChgU3R8, 2),
    prefixed(0xD4, ChgU3R8, 2),
    prefixed(0xD5, ChgU3R8, 2),
    prefixed(0xD6, ChgU3Hlr, 4),
    prefixed(0xD7, ChgU3R8, 2),
    prefixed(0xD8, ChgU3R8, 2),
    prefixed(0xD9, ChgU3R8, 2),
    prefixed(0xDA, ChgU3R8, 2),
    prefixed(0xDB, ChgU3R8, 2),
    prefixed(0xDC, ChgU3R8, 2),
    prefixed(0xDD, ChgU3R8, 2),
    prefixed(0xDE, ChgU3Hlr, 4),
    prefixed(0xDF, ChgU3R8, 2),
    prefixed(0xE0, ChgU3R8, 2),
    prefixed(0xE1, ChgU3R8, 2),
    prefixed(0xE2, ChgU3R8, 2),
    prefixed(0xE3, ChgU3R8, 2),
    prefixed(0xE4, ChgU3R8, 2),
    prefixed(0xE5, ChgU3R8, 2),
    prefixed(0xE6, ChgU3Hlr, 4),
    prefixed(0xE7, ChgU3R8, 2),
    prefixed(0xE8, ChgU3R8, 2),
    prefixed(0xE9, ChgU3R8, 2),
    prefixed(0xEA, ChgU3R8, 2),
    prefixed(0xEB, ChgU3R8, 2),
    prefixed(0xEC, ChgU3R8, 2),
    prefixed(0xED, ChgU3R8, 2),
    prefixed(0xEE, ChgU3Hlr, 4),
    prefixed(0xEF, ChgU3R8, 2),
    prefixed(0xF0, ChgU3R8, 2),
    prefixed(0xF1, ChgU3R8, 2),
    prefixed(0xF2, ChgU3R8, 2),
    prefixed(0xF3, ChgU3R8, 2),
    prefixed(0xF4, ChgU3R8, 2),
    prefixed(0xF5, ChgU3R8, 2),
    prefixed(0xF6, ChgU3Hlr, 4),
    prefixed(0xF7, ChgU3R8, 2),
    prefixed(0xF8, ChgU3R8, 2),
    prefixed(0xF9, ChgU3R8, 2),
    prefixed(0xFA, ChgU3R8, 2),
    prefixed(0xFB, ChgU3R8, 2),
    prefixed(0xFC, ChgU3R8, 2),
    prefixed(0xFD, ChgU3R8, 2),
    prefixed(0xFE, ChgU3Hlr, 4),
    prefixed(0xFF, ChgU3R8, 2),
];

pub type OpTable = [Option<Opcode>; 0x100];

fn build_table(ops: &[Opcode]) -> OpTable {
    let mut table = [None; 0x100];
    for op in ops {
        let slot = &mut table[op.encoding as usize];
        assert!(slot.is_none(), "0x{:0>2X} is described twice", op.encoding);
        *slot = Some(*op);
    }
    table
}

static DIRECT_TABLE: LazyLock<OpTable> = LazyLock::new(|| build_table(DIRECT_OPS));
static PREFIXED_TABLE: LazyLock<OpTable> = LazyLock::new(|| build_table(PREFIXED_OPS));

/// Looks up an unprefixed opcode. The eleven unused encodings (and the prefix byte itself) yield
/// `None`.
pub fn direct_op(encoding: u8) -> Option<Opcode> {
    DIRECT_TABLE[encoding as usize]
}

/// Looks up the opcode that follows a [`PREFIX`] byte. Every encoding is used.
pub fn prefixed_op(encoding: u8) -> Opcode {
    match PREFIXED_TABLE[encoding as usize] {
        Some(op) => op,
        None => unreachable!("every prefixed encoding is described"),
    }
}
