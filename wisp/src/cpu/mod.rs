//! The Sharp LR35902 core: decoding, execution, and interrupt dispatch.

use std::fmt::Display;

use tracing::debug;
use tracing::trace;

pub mod alu;
mod interrupt;
pub mod opcode;
mod registers;

pub use alu::Flags;
pub use interrupt::*;
pub use registers::*;

use crate::bits;
use crate::mem::map;
use crate::mem::Clocked;
use crate::mem::Component;
use crate::mem::MemoryLike;
use crate::mem::Ram;
use alu::AluResult;
use alu::RotDir;
use opcode::Family::*;
use opcode::Opcode;

#[cfg(test)]
mod cpu_tests;

/// Machine cycles spent pushing PC and jumping to a handler.
pub const INTERRUPT_DISPATCH_CYCLES: u64 = 5;

/// Marks a halted CPU. No cycle ever reaches it, so only a pending interrupt wakes the CPU back up.
const HALTED: u64 = u64::MAX;

/// Where each flag written by an instruction comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagSrc {
    /// Cleared
    Zero,
    /// Set
    One,
    /// Taken from the ALU result
    Alu,
    /// Left as it was
    Keep,
}

use FlagSrc::*;

const FROM_ALU: [FlagSrc; 4] = [Alu; 4];

/// The CPU owns IE, IF, and high RAM, and reaches everything else through the bus it is handed
/// every cycle.
#[derive(Debug, Clone)]
pub struct Cpu {
    regs: RegisterFile<Reg, 8>,
    pc: u16,
    sp: u16,
    ime: bool,
    /// ADDR FFFF
    ie: u8,
    /// ADDR FF0F, shared with everything that can raise an interrupt.
    interrupts: InterruptSink,
    high_ram: Ram,
    /// The cycle at which the next instruction (or interrupt dispatch) starts.
    next_non_idle_cycle: u64,
}

impl Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CPU {{")?;
        for reg in [Reg::A, Reg::B, Reg::C, Reg::D, Reg::E, Reg::H, Reg::L] {
            write!(f, " {reg}=0x{:0>2X}", self.regs.get(reg))?;
        }
        write!(
            f,
            " F={} SP=0x{:0>4X} PC=0x{:0>4X} IME={} IE=0b{:0>5b} IF=0b{:0>5b} }}",
            self.flags(),
            self.sp,
            self.pc,
            self.ime,
            self.ie,
            self.interrupts.pending()
        )
    }
}

impl Cpu {
    /// `interrupts` is the IF register; hand clones of it to the devices that raise interrupts.
    pub fn new(interrupts: InterruptSink) -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: 0,
            sp: 0,
            ime: false,
            ie: 0,
            interrupts,
            high_ram: Ram::new(map::HIGH_RAM_SIZE),
            next_non_idle_cycle: 0,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn reg(&self, reg: Reg) -> u8 {
        self.regs.get(reg)
    }

    pub fn reg16(&self, reg: Reg16) -> u16 {
        let (high, low) = reg.halves();
        bits::make16(self.regs.get(high), self.regs.get(low))
    }

    pub fn flags(&self) -> Flags {
        self.regs.get(Reg::F).into()
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    pub fn interrupt_enable(&self) -> u8 {
        self.ie
    }

    pub fn interrupt_flags(&self) -> u8 {
        self.interrupts.pending()
    }

    pub fn is_halted(&self) -> bool {
        self.next_non_idle_cycle == HALTED
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn set_sp(&mut self, sp: u16) {
        self.sp = sp;
    }

    /// The low nibble of F does not exist, so writes to AF drop it.
    pub fn set_reg16(&mut self, reg: Reg16, value: u16) {
        let [high, low] = value.to_be_bytes();
        let (high_reg, low_reg) = reg.halves();
        self.regs.set(high_reg, high);
        self.regs.set(low_reg, if reg == Reg16::AF { low & 0xF0 } else { low });
    }

    /// A handle onto IF for devices that need to raise interrupts.
    pub fn interrupt_sink(&self) -> InterruptSink {
        self.interrupts.clone()
    }

    pub fn request_interrupt(&self, interrupt: Interrupt) {
        self.interrupts.request(interrupt);
    }

    fn pending_enabled(&self) -> u8 {
        self.ie & self.interrupts.pending() & 0x1F
    }

    fn read8<M: MemoryLike + ?Sized>(&self, bus: &M, address: u16) -> u8 {
        self.read(address).unwrap_or_else(|| bus.read_byte(address))
    }

    fn write8<M: MemoryLike + ?Sized>(&mut self, bus: &mut M, address: u16, data: u8) {
        Component::write(self, address, data);
        bus.write_byte(address, data);
    }

    fn read16<M: MemoryLike + ?Sized>(&self, bus: &M, address: u16) -> u16 {
        let low = self.read8(bus, address);
        let high = self.read8(bus, address.wrapping_add(1));
        bits::make16(high, low)
    }

    fn write16<M: MemoryLike + ?Sized>(&mut self, bus: &mut M, address: u16, data: u16) {
        let [high, low] = data.to_be_bytes();
        self.write8(bus, address, low);
        self.write8(bus, address.wrapping_add(1), high);
    }

    fn push16<M: MemoryLike + ?Sized>(&mut self, bus: &mut M, data: u16) {
        self.sp = self.sp.wrapping_sub(2);
        self.write16(bus, self.sp, data);
    }

    fn pop16<M: MemoryLike + ?Sized>(&mut self, bus: &M) -> u16 {
        let data = self.read16(bus, self.sp);
        self.sp = self.sp.wrapping_add(2);
        data
    }

    /// The byte following the opcode.
    fn n8<M: MemoryLike + ?Sized>(&self, bus: &M) -> u8 {
        self.read8(bus, self.pc.wrapping_add(1))
    }

    /// The two bytes following the opcode, little-endian.
    fn n16<M: MemoryLike + ?Sized>(&self, bus: &M) -> u16 {
        self.read16(bus, self.pc.wrapping_add(1))
    }

    /// The byte following the opcode as a signed offset, sign-extended.
    fn e8<M: MemoryLike + ?Sized>(&self, bus: &M) -> u16 {
        self.n8(bus) as i8 as u16
    }

    /// Reads the 3-bit operand field in the low bits of `field`. Slot 6 is the byte at `(HL)`.
    fn operand<M: MemoryLike + ?Sized>(&self, bus: &M, field: u8) -> u8 {
        match Reg::from_field(field) {
            Some(reg) => self.regs.get(reg),
            None => self.read8(bus, self.reg16(Reg16::HL)),
        }
    }

    fn set_operand<M: MemoryLike + ?Sized>(&mut self, bus: &mut M, field: u8, value: u8) {
        match Reg::from_field(field) {
            Some(reg) => self.regs.set(reg, value),
            None => self.write8(bus, self.reg16(Reg16::HL), value),
        }
    }

    /// The pair field as used by the 16-bit load and arithmetic families, where slot 3 is SP.
    fn pair_or_sp(&self, field: u8) -> u16 {
        match field & 0b11 {
            3 => self.sp,
            f => self.reg16(Reg16::from_field(f)),
        }
    }

    fn set_pair_or_sp(&mut self, field: u8, value: u16) {
        match field & 0b11 {
            3 => self.sp = value,
            f => self.set_reg16(Reg16::from_field(f), value),
        }
    }

    /// Moves HL one step after a `(HL+)`/`(HL-)` access. Bit 4 of the encoding picks the direction.
    fn step_hl(&mut self, encoding: u8) -> u16 {
        let hl = self.reg16(Reg16::HL);
        let next = if bits::test_bit(encoding, 4) {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        };
        self.set_reg16(Reg16::HL, next);
        hl
    }

    /// The condition encoded in bits 3-4: NZ, Z, NC, C.
    fn condition(&self, encoding: u8) -> bool {
        let flags = self.flags();
        match bits::extract(encoding, 3, 2) {
            0 => !flags.z,
            1 => flags.z,
            2 => !flags.c,
            _ => flags.c,
        }
    }

    fn merge_flags(&mut self, alu: Flags, [z, n, h, c]: [FlagSrc; 4]) {
        let cpu = self.flags();
        let pick = |src: FlagSrc, alu: bool, cpu: bool| match src {
            Zero => false,
            One => true,
            Alu => alu,
            Keep => cpu,
        };
        let flags = Flags::new(
            pick(z, alu.z, cpu.z),
            pick(n, alu.n, cpu.n),
            pick(h, alu.h, cpu.h),
            pick(c, alu.c, cpu.c),
        );
        self.regs.set(Reg::F, flags.as_byte());
    }

    /// Stores an 8-bit result in A and takes all of its flags.
    fn accumulate(&mut self, result: AluResult) {
        self.regs.set(Reg::A, result.value8());
        self.merge_flags(result.flags, FROM_ALU);
    }

    /// Writes an 8-bit result back to the operand it came from and takes all of its flags.
    fn write_back<M: MemoryLike + ?Sized>(&mut self, bus: &mut M, field: u8, result: AluResult) {
        self.set_operand(bus, field, result.value8());
        self.merge_flags(result.flags, FROM_ALU);
    }

    fn fetch<M: MemoryLike + ?Sized>(&self, bus: &M) -> Opcode {
        let encoding = self.read8(bus, self.pc);
        if encoding == opcode::PREFIX {
            return opcode::prefixed_op(self.n8(bus));
        }
        match opcode::direct_op(encoding) {
            Some(op) => op,
            None => panic!(
                "unused opcode 0x{encoding:0>2X} at 0x{:0>4X}",
                self.pc
            ),
        }
    }

    /// Services the highest priority interrupt, if IME allows it and one is pending. Returns
    /// `true` if an interrupt was dispatched.
    fn dispatch_interrupt<M: MemoryLike + ?Sized>(&mut self, bus: &mut M) -> bool {
        if !self.ime {
            return false;
        }
        let Some(interrupt) = Interrupt::highest(self.pending_enabled()) else {
            return false;
        };
        debug!("Dispatching {interrupt} interrupt from PC=0x{:0>4X}", self.pc);
        self.ime = false;
        self.interrupts.clear(interrupt);
        self.push16(bus, self.pc);
        self.pc = interrupt.handler();
        self.next_non_idle_cycle += INTERRUPT_DISPATCH_CYCLES;
        true
    }

    fn step<M: MemoryLike + ?Sized>(&mut self, bus: &mut M) {
        if self.dispatch_interrupt(bus) {
            return;
        }
        let op = self.fetch(bus);
        trace!("0x{:0>4X}: {op}", self.pc);
        self.next_non_idle_cycle += u64::from(op.cycles);
        self.pc = self.execute(op, bus);
    }

    /// Runs one instruction and returns where the next one starts.
    fn execute<M: MemoryLike + ?Sized>(&mut self, op: Opcode, bus: &mut M) -> u16 {
        let e = op.encoding;
        let mut next_pc = self.pc.wrapping_add(u16::from(op.total_bytes));
        let mut taken = false;
        match op.family {
            Nop => {}

            // Loads
            LdR8R8 | LdR8Hlr | LdHlrR8 => {
                let value = self.operand(bus, e);
                self.set_operand(bus, e >> 3, value);
            }
            LdR8N8 | LdHlrN8 => {
                let value = self.n8(bus);
                self.set_operand(bus, e >> 3, value);
            }
            LdAHlru => {
                let address = self.step_hl(e);
                self.regs.set(Reg::A, self.read8(bus, address));
            }
            LdHlruA => {
                let address = self.step_hl(e);
                self.write8(bus, address, self.regs.get(Reg::A));
            }
            LdAN8r => {
                let address = 0xFF00 | u16::from(self.n8(bus));
                self.regs.set(Reg::A, self.read8(bus, address));
            }
            LdN8rA => {
                let address = 0xFF00 | u16::from(self.n8(bus));
                self.write8(bus, address, self.regs.get(Reg::A));
            }
            LdACr => {
                let address = 0xFF00 | u16::from(self.regs.get(Reg::C));
                self.regs.set(Reg::A, self.read8(bus, address));
            }
            LdCrA => {
                let address = 0xFF00 | u16::from(self.regs.get(Reg::C));
                self.write8(bus, address, self.regs.get(Reg::A));
            }
            LdAN16r => {
                let address = self.n16(bus);
                self.regs.set(Reg::A, self.read8(bus, address));
            }
            LdN16rA => {
                let address = self.n16(bus);
                self.write8(bus, address, self.regs.get(Reg::A));
            }
            LdABcr | LdADer => {
                let pair = if op.family == LdABcr { Reg16::BC } else { Reg16::DE };
                self.regs.set(Reg::A, self.read8(bus, self.reg16(pair)));
            }
            LdBcrA | LdDerA => {
                let pair = if op.family == LdBcrA { Reg16::BC } else { Reg16::DE };
                self.write8(bus, self.reg16(pair), self.regs.get(Reg::A));
            }
            LdR16SpN16 => {
                let value = self.n16(bus);
                self.set_pair_or_sp(e >> 4, value);
            }
            LdN16rSp => {
                let address = self.n16(bus);
                self.write16(bus, address, self.sp);
            }
            LdSpHl => self.sp = self.reg16(Reg16::HL),
            PushR16 => self.push16(bus, self.reg16(Reg16::from_field(e >> 4))),
            PopR16 => {
                let value = self.pop16(bus);
                self.set_reg16(Reg16::from_field(e >> 4), value);
            }

            // 8-bit arithmetic and logic
            AddAR8 | AddAHlr | AddAN8 | SubAR8 | SubAHlr | SubAN8 | AndAR8 | AndAHlr | AndAN8
            | OrAR8 | OrAHlr | OrAN8 | XorAR8 | XorAHlr | XorAN8 | CpAR8 | CpAHlr | CpAN8 => {
                let a = self.regs.get(Reg::A);
                let value = match op.family {
                    AddAN8 | SubAN8 | AndAN8 | OrAN8 | XorAN8 | CpAN8 => self.n8(bus),
                    _ => self.operand(bus, e),
                };
                // ADC and SBC share their family with ADD and SUB, and differ in bit 3
                let carry = bits::test_bit(e, 3) && self.flags().c;
                match op.family {
                    AddAR8 | AddAHlr | AddAN8 => {
                        self.accumulate(alu::add_with_carry(a, value, carry))
                    }
                    SubAR8 | SubAHlr | SubAN8 => {
                        self.accumulate(alu::sub_with_borrow(a, value, carry))
                    }
                    AndAR8 | AndAHlr | AndAN8 => self.accumulate(alu::and(a, value)),
                    OrAR8 | OrAHlr | OrAN8 => self.accumulate(alu::or(a, value)),
                    XorAR8 | XorAHlr | XorAN8 => self.accumulate(alu::xor(a, value)),
                    _ => self.merge_flags(alu::sub(a, value).flags, FROM_ALU),
                }
            }
            IncR8 | IncHlr => {
                let result = alu::add(self.operand(bus, e >> 3), 1);
                self.set_operand(bus, e >> 3, result.value8());
                self.merge_flags(result.flags, [Alu, Zero, Alu, Keep]);
            }
            DecR8 | DecHlr => {
                let result = alu::sub(self.operand(bus, e >> 3), 1);
                self.set_operand(bus, e >> 3, result.value8());
                self.merge_flags(result.flags, [Alu, One, Alu, Keep]);
            }
            Cpl => {
                self.regs.set(Reg::A, bits::complement8(self.regs.get(Reg::A)));
                self.merge_flags(Flags::default(), [Keep, One, One, Keep]);
            }
            Daa => {
                let flags = self.flags();
                let result = alu::bcd_adjust(self.regs.get(Reg::A), flags.n, flags.h, flags.c);
                self.regs.set(Reg::A, result.value8());
                self.merge_flags(result.flags, [Alu, Keep, Zero, Alu]);
            }
            Sccf => {
                // CCF has bit 3 set, SCF does not
                let c = !bits::test_bit(e, 3) || !self.flags().c;
                self.merge_flags(Flags::new(false, false, false, c), [Keep, Zero, Zero, Alu]);
            }

            // 16-bit arithmetic
            IncR16Sp => self.set_pair_or_sp(e >> 4, self.pair_or_sp(e >> 4).wrapping_add(1)),
            DecR16Sp => self.set_pair_or_sp(e >> 4, self.pair_or_sp(e >> 4).wrapping_sub(1)),
            AddHlR16Sp => {
                let result = alu::add16_high(self.reg16(Reg16::HL), self.pair_or_sp(e >> 4));
                self.set_reg16(Reg16::HL, result.value);
                self.merge_flags(result.flags, [Keep, Zero, Alu, Alu]);
            }
            LdHlSpS8 => {
                let result = alu::add16_low(self.sp, self.e8(bus));
                // 0xF8 loads HL, 0xE8 adds to SP
                if bits::test_bit(e, 4) {
                    self.set_reg16(Reg16::HL, result.value);
                } else {
                    self.sp = result.value;
                }
                self.merge_flags(result.flags, [Zero, Zero, Alu, Alu]);
            }

            // Rotates and shifts
            Rotca | Rota => {
                let dir = rotation(e);
                let a = self.regs.get(Reg::A);
                let result = if op.family == Rotca {
                    alu::rotate(dir, a)
                } else {
                    alu::rotate_through_carry(dir, a, self.flags().c)
                };
                self.regs.set(Reg::A, result.value8());
                self.merge_flags(result.flags, [Zero, Alu, Alu, Alu]);
            }
            RotcR8 | RotcHlr => {
                let result = alu::rotate(rotation(e), self.operand(bus, e));
                self.write_back(bus, e, result);
            }
            RotR8 | RotHlr => {
                let carry = self.flags().c;
                let result = alu::rotate_through_carry(rotation(e), self.operand(bus, e), carry);
                self.write_back(bus, e, result);
            }
            SlaR8 | SlaHlr => {
                let result = alu::shift_left(self.operand(bus, e));
                self.write_back(bus, e, result);
            }
            SraR8 | SraHlr => {
                let result = alu::shift_right_arithmetic(self.operand(bus, e));
                self.write_back(bus, e, result);
            }
            SrlR8 | SrlHlr => {
                let result = alu::shift_right_logical(self.operand(bus, e));
                self.write_back(bus, e, result);
            }
            SwapR8 | SwapHlr => {
                let result = alu::swap(self.operand(bus, e));
                self.write_back(bus, e, result);
            }

            // Single bits
            BitU3R8 | BitU3Hlr => {
                let result = alu::test_bit(self.operand(bus, e), bits::extract(e, 3, 3));
                self.merge_flags(result.flags, [Alu, Zero, One, Keep]);
            }
            ChgU3R8 | ChgU3Hlr => {
                // SET has bit 6 set, RES does not
                let value = bits::set_bit(
                    self.operand(bus, e),
                    bits::extract(e, 3, 3),
                    bits::test_bit(e, 6),
                );
                self.set_operand(bus, e, value);
            }

            // Control flow
            JpHl => next_pc = self.reg16(Reg16::HL),
            JpN16 => next_pc = self.n16(bus),
            JpCcN16 => {
                taken = self.condition(e);
                if taken {
                    next_pc = self.n16(bus);
                }
            }
            JrE8 => next_pc = next_pc.wrapping_add(self.e8(bus)),
            JrCcE8 => {
                taken = self.condition(e);
                if taken {
                    next_pc = next_pc.wrapping_add(self.e8(bus));
                }
            }
            CallN16 => {
                let target = self.n16(bus);
                self.push16(bus, next_pc);
                next_pc = target;
            }
            CallCcN16 => {
                taken = self.condition(e);
                if taken {
                    let target = self.n16(bus);
                    self.push16(bus, next_pc);
                    next_pc = target;
                }
            }
            RstU3 => {
                self.push16(bus, next_pc);
                next_pc = u16::from(e & 0b0011_1000);
            }
            Ret => next_pc = self.pop16(bus),
            RetCc => {
                taken = self.condition(e);
                if taken {
                    next_pc = self.pop16(bus);
                }
            }
            Reti => {
                self.ime = true;
                next_pc = self.pop16(bus);
            }

            // Misc
            Edi => self.ime = bits::test_bit(e, 3),
            Halt => {
                debug!("Halted at PC=0x{:0>4X}", self.pc);
                self.next_non_idle_cycle = HALTED;
            }
            Stop => panic!("STOP at 0x{:0>4X} is not supported", self.pc),
        }
        if taken {
            self.next_non_idle_cycle += u64::from(op.additional_cycles);
        }
        next_pc
    }
}

/// Bit 3 of a rotate encoding picks the direction.
fn rotation(encoding: u8) -> RotDir {
    if bits::test_bit(encoding, 3) {
        RotDir::Right
    } else {
        RotDir::Left
    }
}

impl Clocked for Cpu {
    fn cycle<M: MemoryLike + ?Sized>(&mut self, cycle: u64, bus: &mut M) {
        if self.is_halted() && self.pending_enabled() != 0 {
            self.next_non_idle_cycle = cycle;
        }
        if cycle == self.next_non_idle_cycle {
            self.step(bus);
        }
    }
}

impl Component for Cpu {
    fn read(&self, address: u16) -> Option<u8> {
        match address {
            map::REG_IE => Some(self.ie),
            map::REG_IF => Some(self.interrupts.pending()),
            map::HIGH_RAM_START..map::HIGH_RAM_END => Some(
                self.high_ram
                    .read(usize::from(address - map::HIGH_RAM_START)),
            ),
            _ => None,
        }
    }

    fn write(&mut self, address: u16, data: u8) {
        match address {
            map::REG_IE => self.ie = data,
            map::REG_IF => self.interrupts.set_pending(data),
            map::HIGH_RAM_START..map::HIGH_RAM_END => self
                .high_ram
                .write(usize::from(address - map::HIGH_RAM_START), data),
            _ => {}
        }
    }
}
