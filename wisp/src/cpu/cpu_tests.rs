use super::*;
use crate::bits::Bit;
use crate::mem::Bus;
use crate::mem::RamController;

/// A CPU wired to 64 KiB of flat RAM holding a program at 0x0000.
struct Harness {
    cpu: Cpu,
    bus: Bus,
    now: u64,
}

impl Harness {
    fn new(program: &[u8]) -> Self {
        let mut ram = Ram::new(0x1_0000);
        program
            .iter()
            .enumerate()
            .for_each(|(i, byte)| ram.write(i, *byte));
        let mut bus = Bus::new();
        bus.attach(RamController::new(ram, 0));
        let mut cpu = Cpu::new(InterruptSink::new());
        cpu.set_sp(0xFFFE);
        Self { cpu, bus, now: 0 }
    }

    /// Ticks until the CPU has acted once more.
    fn step(&mut self) {
        self.now = self.cpu.next_non_idle_cycle;
        self.cpu.cycle(self.now, &mut self.bus);
        self.now += 1;
    }

    fn steps(&mut self, count: usize) {
        (0..count).for_each(|_| self.step());
    }

    /// Ticks every cycle from `now` up to, but not including, `end`.
    fn run_to(&mut self, end: u64) {
        while self.now < end {
            self.cpu.cycle(self.now, &mut self.bus);
            self.now += 1;
        }
    }

    fn peek(&self, address: u16) -> u8 {
        self.cpu.read8(&self.bus, address)
    }
}

#[test]
fn load_then_add_sets_half_and_full_carry() {
    // LD A,0x05; ADD A,0xFF
    let mut h = Harness::new(&[0x3E, 0x05, 0xC6, 0xFF]);
    h.steps(2);
    assert_eq!(h.cpu.reg(Reg::A), 0x04);
    assert_eq!(h.cpu.flags(), Flags::new(false, false, true, true));
    assert_eq!(h.cpu.pc(), 4);
    assert_eq!(h.cpu.next_non_idle_cycle, 4);
}

#[test]
fn adc_and_sbc_use_the_carry() {
    // SCF; LD B,0x01; ADC A,B; SCF; SBC A,B
    let mut h = Harness::new(&[0x37, 0x06, 0x01, 0x88, 0x37, 0x98]);
    h.steps(3);
    assert_eq!(h.cpu.reg(Reg::A), 0x02);
    h.steps(2);
    assert_eq!(h.cpu.reg(Reg::A), 0x00);
    assert!(h.cpu.flags().z);
    assert!(h.cpu.flags().n);
}

#[test]
fn compare_only_touches_flags() {
    // LD A,0x10; CP 0x10
    let mut h = Harness::new(&[0x3E, 0x10, 0xFE, 0x10]);
    h.steps(2);
    assert_eq!(h.cpu.reg(Reg::A), 0x10);
    assert_eq!(h.cpu.flags(), Flags::new(true, true, false, false));
}

#[test]
fn inc_and_dec_keep_carry() {
    // SCF; LD B,0xFF; INC B; DEC B
    let mut h = Harness::new(&[0x37, 0x06, 0xFF, 0x04, 0x05]);
    h.steps(3);
    assert_eq!(h.cpu.reg(Reg::B), 0);
    assert_eq!(h.cpu.flags(), Flags::new(true, false, true, true));
    h.step();
    assert_eq!(h.cpu.reg(Reg::B), 0xFF);
    assert_eq!(h.cpu.flags(), Flags::new(false, true, true, true));
}

#[test]
fn hl_indirect_loads_and_increments() {
    // LD HL,0xC000; LD (HL+),A with A=0x42; LD A,(HL-); INC (HL)
    let mut h = Harness::new(&[0x21, 0x00, 0xC0, 0x3E, 0x42, 0x22, 0x3A, 0x34]);
    h.steps(3);
    assert_eq!(h.peek(0xC000), 0x42);
    assert_eq!(h.cpu.reg16(Reg16::HL), 0xC001);
    h.step();
    assert_eq!(h.cpu.reg(Reg::A), 0x00);
    assert_eq!(h.cpu.reg16(Reg16::HL), 0xC000);
    h.step();
    assert_eq!(h.peek(0xC000), 0x43);
}

#[test]
fn pair_slot_three_is_sp_for_16_bit_arithmetic() {
    // LD SP,0x1234; INC SP; LD HL,0x0001; ADD HL,SP
    let mut h = Harness::new(&[0x31, 0x34, 0x12, 0x33, 0x21, 0x01, 0x00, 0x39]);
    h.steps(4);
    assert_eq!(h.cpu.sp(), 0x1235);
    assert_eq!(h.cpu.reg16(Reg16::HL), 0x1236);
    assert!(!h.cpu.flags().n);
}

#[test]
fn pair_slot_three_is_af_for_the_stack() {
    // LD BC,0x12FF; PUSH BC; POP AF
    let mut h = Harness::new(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
    h.steps(2);
    assert_eq!(h.cpu.sp(), 0xFFFC);
    // Low byte first
    assert_eq!(h.peek(0xFFFC), 0xFF);
    assert_eq!(h.peek(0xFFFD), 0x12);
    h.step();
    assert_eq!(h.cpu.sp(), 0xFFFE);
    assert_eq!(h.cpu.reg16(Reg16::AF), 0x12F0);
}

#[test]
fn sp_relative_adds() {
    // LD SP,0x00FF; LD HL,SP+1; ADD SP,-1
    let mut h = Harness::new(&[0x31, 0xFF, 0x00, 0xF8, 0x01, 0xE8, 0xFF]);
    h.steps(2);
    assert_eq!(h.cpu.reg16(Reg16::HL), 0x0100);
    assert_eq!(h.cpu.sp(), 0x00FF);
    assert_eq!(h.cpu.flags(), Flags::new(false, false, true, true));
    h.step();
    assert_eq!(h.cpu.sp(), 0x00FE);
}

#[test]
fn conditional_branches_only_pay_when_taken() {
    // XOR A; JR NZ,+2; JR Z,+2; NOP; NOP; NOP
    let mut h = Harness::new(&[0xAF, 0x20, 0x02, 0x28, 0x02, 0x00, 0x00, 0x00]);
    h.step();
    h.step();
    assert_eq!(h.cpu.pc(), 3);
    assert_eq!(h.cpu.next_non_idle_cycle, 1 + 2);
    h.step();
    assert_eq!(h.cpu.pc(), 7);
    assert_eq!(h.cpu.next_non_idle_cycle, 1 + 2 + 3);
}

#[test]
fn call_and_return() {
    // CALL 0x0010; ... 0x0010: RET
    let mut program = vec![0xCD, 0x10, 0x00];
    program.resize(0x10, 0x00);
    program.push(0xC9);
    let mut h = Harness::new(&program);
    h.step();
    assert_eq!(h.cpu.pc(), 0x10);
    assert_eq!(h.cpu.sp(), 0xFFFC);
    assert_eq!(h.peek(0xFFFC), 0x03);
    h.step();
    assert_eq!(h.cpu.pc(), 0x03);
    assert_eq!(h.cpu.sp(), 0xFFFE);
}

#[test]
fn restart_vectors() {
    // RST 0x28
    let mut h = Harness::new(&[0xEF]);
    h.step();
    assert_eq!(h.cpu.pc(), 0x28);
    assert_eq!(h.peek(0xFFFC), 0x01);
}

#[test]
fn prefixed_instructions() {
    // LD B,0x81; RLC B; BIT 7,B; SET 7,B; RES 0,B; SWAP B
    let mut h = Harness::new(&[
        0x06, 0x81, 0xCB, 0x00, 0xCB, 0x78, 0xCB, 0xF8, 0xCB, 0x80, 0xCB, 0x30,
    ]);
    h.steps(2);
    assert_eq!(h.cpu.reg(Reg::B), 0x03);
    assert!(h.cpu.flags().c);
    h.step();
    assert_eq!(h.cpu.flags(), Flags::new(true, false, true, true));
    h.steps(2);
    assert_eq!(h.cpu.reg(Reg::B), 0x82);
    h.step();
    assert_eq!(h.cpu.reg(Reg::B), 0x28);
    assert_eq!(h.cpu.pc(), 12);
}

#[test]
fn accumulator_rotates_clear_zero() {
    // XOR A; RLCA
    let mut h = Harness::new(&[0xAF, 0x07]);
    h.steps(2);
    assert_eq!(h.cpu.flags(), Flags::new(false, false, false, false));
}

#[test]
fn daa_after_bcd_addition() {
    // LD A,0x15; ADD A,0x27; DAA
    let mut h = Harness::new(&[0x3E, 0x15, 0xC6, 0x27, 0x27]);
    h.steps(3);
    assert_eq!(h.cpu.reg(Reg::A), 0x42);
    assert!(!h.cpu.flags().c);
}

#[test]
fn interrupt_priority() {
    // EI; NOP
    let mut h = Harness::new(&[0xFB, 0x00, 0x00]);
    h.cpu.write(map::REG_IE, 0b00101);
    h.cpu.request_interrupt(Interrupt::VBlank);
    h.cpu.request_interrupt(Interrupt::Timer);
    h.step();
    assert!(h.cpu.ime());
    h.step();
    assert_eq!(h.cpu.pc(), Interrupt::VBlank.handler());
    assert_eq!(h.cpu.interrupt_flags(), Interrupt::Timer.mask());
    assert!(!h.cpu.ime());
    assert_eq!(h.cpu.sp(), 0xFFFC);
    assert_eq!(h.peek(0xFFFC), 0x01);
    assert_eq!(h.cpu.next_non_idle_cycle, 1 + INTERRUPT_DISPATCH_CYCLES);
}

#[test]
fn halt_until_an_enabled_interrupt() {
    // HALT; INC A
    let mut h = Harness::new(&[0x76, 0x3C]);
    h.step();
    assert!(h.cpu.is_halted());
    h.run_to(100);
    assert_eq!(h.cpu.pc(), 1);

    // Pending but not enabled
    h.cpu.request_interrupt(Interrupt::Serial);
    h.run_to(200);
    assert!(h.cpu.is_halted());

    // IME is off, so execution resumes after HALT without dispatching
    h.cpu.write(map::REG_IE, Interrupt::Serial.mask());
    h.run_to(201);
    assert!(!h.cpu.is_halted());
    assert_eq!(h.cpu.reg(Reg::A), 1);
    assert_eq!(h.cpu.pc(), 2);
    assert_eq!(h.cpu.next_non_idle_cycle, 201);
}

#[test]
fn high_ram_and_interrupt_registers_belong_to_the_cpu() {
    let mut h = Harness::new(&[]);
    h.cpu.write8(&mut h.bus, 0xFF80, 0x12);
    assert_eq!(h.cpu.read(0xFF80), Some(0x12));
    assert_eq!(h.cpu.read(0xFFFE), Some(0));
    assert_eq!(h.cpu.read(0xFF7F), None);
    h.cpu.write(map::REG_IF, 0xFF);
    assert_eq!(h.cpu.interrupt_flags(), 0x1F);
}

#[test]
#[should_panic]
fn stop_is_fatal() {
    let mut h = Harness::new(&[0x10, 0x00]);
    h.step();
}

#[test]
#[should_panic]
fn unused_opcodes_are_fatal() {
    let mut h = Harness::new(&[0xD3]);
    h.step();
}

#[test]
fn display() {
    let cpu = Cpu::new(InterruptSink::new());
    assert!(cpu.to_string().starts_with("CPU { A=0x00 B=0x00"));
}
