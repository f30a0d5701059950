use tracing::info;

use crate::cpu::Cpu;
use crate::cpu::InterruptSink;
use crate::cpu::Reg16;
use crate::lcd::LcdController;
use crate::lcd::LcdImage;
use crate::lcd::LcdReg;
use crate::lcd::CYCLES_PER_FRAME;
use crate::mem::io::Joypad;
use crate::mem::io::Timer;
use crate::mem::map;
use crate::mem::mbc::Cartridge;
use crate::mem::BootRom;
use crate::mem::BootRomController;
use crate::mem::Bus;
use crate::mem::Clocked;
use crate::mem::Component;
use crate::mem::Ram;
use crate::mem::RamController;
use crate::mem::OPEN_BUS;
use crate::Error;

/// Machine cycles per second of emulated time.
pub const CYCLES_PER_SECOND: u64 = 1 << 20;

pub const CYCLES_PER_NANOSECOND: f64 = CYCLES_PER_SECOND as f64 / 1_000_000_000.0;

/// The whole handheld with a cartridge inserted. Nothing happens on its own: the caller moves the
/// machine forward with [`GameBoy::run_until`] or [`GameBoy::step_frame`], which leaves pacing,
/// input, and presentation to the front end.
///
/// Every cycle ticks the timer, then the LCD controller, then the CPU. The LCD controller and the
/// CPU are each handed a view of every other component, so neither needs shared ownership of the
/// other.
pub struct GameBoy {
    cpu: Cpu,
    timer: Timer,
    lcd: LcdController,
    joypad: Joypad,
    /// The cartridge (behind the boot ROM overlay) and work RAM.
    bus: Bus,
    cycles: u64,
}

impl GameBoy {
    /// Without a boot ROM, the machine starts in the state the boot ROM leaves behind, about to
    /// run the cartridge entry point at 0x0100.
    pub fn new(cartridge: Cartridge, boot_rom: Option<BootRom>) -> Self {
        let interrupts = InterruptSink::new();
        let skip_boot = boot_rom.is_none();
        let mut bus = Bus::new();
        bus.attach(BootRomController::new(cartridge, boot_rom));
        bus.attach(
            RamController::new(Ram::new(map::WORK_RAM_SIZE), map::WORK_RAM_START)
                .mirrored_at(map::ECHO_RAM_START, map::ECHO_RAM_END),
        );
        let mut gb = Self {
            cpu: Cpu::new(interrupts.clone()),
            timer: Timer::new(interrupts.clone()),
            lcd: LcdController::new(interrupts.clone()),
            joypad: Joypad::new(interrupts),
            bus,
            cycles: 0,
        };
        if skip_boot {
            info!("No boot ROM, starting from the post-boot state");
            gb.apply_post_boot_state();
        }
        gb
    }

    fn apply_post_boot_state(&mut self) {
        self.cpu.set_pc(0x0100);
        self.cpu.set_sp(0xFFFE);
        self.cpu.set_reg16(Reg16::AF, 0x01B0);
        self.cpu.set_reg16(Reg16::BC, 0x0013);
        self.cpu.set_reg16(Reg16::DE, 0x00D8);
        self.cpu.set_reg16(Reg16::HL, 0x014D);
        self.write(map::REGS_LCDC_START + LcdReg::Lcdc as u16, 0x91);
        self.write(map::REGS_LCDC_START + LcdReg::Bgp as u16, 0xFC);
    }

    /// The number of cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn lcd(&self) -> &LcdController {
        &self.lcd
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn joypad_mut(&mut self) -> &mut Joypad {
        &mut self.joypad
    }

    /// The last completed frame.
    pub fn current_image(&self) -> &LcdImage {
        self.lcd.current_image()
    }

    /// Reads the address space the way the CPU sees it.
    pub fn read(&self, address: u16) -> u8 {
        self.cpu
            .read(address)
            .or_else(|| self.lcd.read(address))
            .or_else(|| self.timer.read(address))
            .or_else(|| self.joypad.read(address))
            .or_else(|| self.bus.read(address))
            .unwrap_or(OPEN_BUS)
    }

    pub fn write(&mut self, address: u16, data: u8) {
        self.cpu.write(address, data);
        self.lcd.write(address, data);
        self.timer.write(address, data);
        self.joypad.write(address, data);
        self.bus.write(address, data);
    }

    /// Runs until `cycle` cycles have elapsed in total. Asking for a cycle that has already passed
    /// is an error and leaves the machine untouched.
    pub fn run_until(&mut self, cycle: u64) -> Result<(), Error> {
        if cycle < self.cycles {
            return Err(Error::CycleInPast {
                requested: cycle,
                elapsed: self.cycles,
            });
        }
        while self.cycles < cycle {
            self.tick();
        }
        Ok(())
    }

    /// Runs for the length of one frame and returns the latest finished frame.
    pub fn step_frame(&mut self) -> &LcdImage {
        (0..CYCLES_PER_FRAME).for_each(|_| self.tick());
        self.lcd.current_image()
    }

    fn tick(&mut self) {
        let now = self.cycles;
        let Self {
            cpu,
            timer,
            lcd,
            joypad,
            bus,
            ..
        } = self;
        timer.cycle(now, bus);
        let others: &mut [&mut dyn Component] =
            &mut [&mut *cpu, &mut *timer, &mut *joypad, &mut *bus];
        lcd.cycle(now, others);
        let others: &mut [&mut dyn Component] =
            &mut [&mut *lcd, &mut *timer, &mut *joypad, &mut *bus];
        cpu.cycle(now, others);
        self.cycles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Reg;
    use crate::mem::mbc::tests::blank_rom;

    fn gameboy(program: &[u8]) -> GameBoy {
        let mut rom = blank_rom(0x00, 0x8000);
        rom[0x100..0x100 + program.len()].copy_from_slice(program);
        GameBoy::new(Cartridge::from_bytes(rom).unwrap(), None)
    }

    #[test]
    fn post_boot_state() {
        let gb = gameboy(&[]);
        let cpu = gb.cpu();
        assert_eq!(cpu.pc(), 0x0100);
        assert_eq!(cpu.sp(), 0xFFFE);
        assert_eq!(cpu.reg16(Reg16::AF), 0x01B0);
        assert_eq!(cpu.reg16(Reg16::BC), 0x0013);
        assert_eq!(cpu.reg16(Reg16::DE), 0x00D8);
        assert_eq!(cpu.reg16(Reg16::HL), 0x014D);
        assert_eq!(gb.read(0xFF40), 0x91);
        assert_eq!(gb.read(0xFF47), 0xFC);
    }

    #[test]
    fn cycles_in_the_past_are_rejected() {
        let mut gb = gameboy(&[]);
        gb.run_until(10).unwrap();
        let pc = gb.cpu().pc();
        let err = gb.run_until(9).unwrap_err();
        assert!(matches!(
            err,
            Error::CycleInPast {
                requested: 9,
                elapsed: 10
            }
        ));
        assert_eq!(gb.cycles(), 10);
        assert_eq!(gb.cpu().pc(), pc);
        gb.run_until(10).unwrap();
        assert_eq!(gb.cycles(), 10);
    }

    #[test]
    fn program_writes_reach_work_ram() {
        // LD A,0x42; LD (0xC000),A; LD A,(0xE000)
        let mut gb = gameboy(&[0x3E, 0x42, 0xEA, 0x00, 0xC0, 0x3E, 0x00, 0xFA, 0x00, 0xE0]);
        gb.run_until(2 + 4 + 2 + 4).unwrap();
        assert_eq!(gb.read(0xC000), 0x42);
        assert_eq!(gb.cpu().reg(Reg::A), 0x42);
        assert_eq!(gb.cpu().pc(), 0x010A);
    }

    #[test]
    fn io_registers_are_reachable() {
        let mut gb = gameboy(&[]);
        gb.write(0xFF80, 0x11);
        gb.write(0xFF06, 0x22);
        gb.write(0xFF42, 0x33);
        gb.write(0xFEA0, 0x44);
        assert_eq!(gb.read(0xFF80), 0x11);
        assert_eq!(gb.read(0xFF06), 0x22);
        assert_eq!(gb.read(0xFF42), 0x33);
        assert_eq!(gb.read(0xFEA0), OPEN_BUS);
        assert_eq!(gb.read(0xFF00), 0xFF);
    }

    #[test]
    fn frames_take_a_fixed_number_of_cycles() {
        // JR -2
        let mut gb = gameboy(&[0x18, 0xFE]);
        gb.step_frame();
        assert_eq!(gb.cycles(), CYCLES_PER_FRAME);
        // The display was switched on at cycle 0, so this is the last line of the first frame
        assert!(gb.lcd().mode().is_v_blank());
        assert_eq!(gb.read(0xFF44), 153);
        assert_eq!(gb.cpu().pc(), 0x0100);
    }
}
